//! medid CLI
//!
//! Entry point for the `medid` command-line tool.

use clap::{Parser, Subcommand};
use medid::config::{default_config_path, merge_into, EffectiveConfig, MedidSettings};
use medid::crypto::{self, KeyPair};
use medid::hash::verify_entries;
use medid::package::{validate, PACKAGE_EXTENSION};
use medid::{MediaCollection, MediaEntry, MedidDocument, SaveOptions};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use zeroize::Zeroizing;

/// Environment variable consulted when `--password` is not given
const PASSWORD_ENV: &str = "MEDID_PASSWORD";

#[derive(Parser)]
#[command(name = "medid")]
#[command(about = "Build, sign and verify medid media packages", version)]
struct Cli {
    /// Path to config file (default: ~/.config/medid/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an RSA key pair
    Keygen {
        /// Directory for <name>.key and <name>.pub
        #[arg(long, short = 'o', default_value = ".")]
        out_dir: PathBuf,

        /// Base file name for the key files
        #[arg(long, default_value = "medid")]
        name: String,

        /// Key size in bits (default from config: 2048)
        #[arg(long)]
        bits: Option<usize>,

        /// Encrypt the private key with this password
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,
    },

    /// Package media files, optionally signing the document
    Pack {
        /// Collection name
        #[arg(long)]
        name: String,

        #[arg(long)]
        publisher: Option<String>,

        /// Output package path (".medid" is appended when there is no extension)
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Private key (DER, or encrypted blob when a password is given)
        #[arg(long)]
        key: Option<PathBuf>,

        /// Public key to embed as public.key
        #[arg(long)]
        public_key: Option<PathBuf>,

        /// Signer name recorded in the signature
        #[arg(long)]
        signer: Option<String>,

        /// Public key hint (default: fingerprint of --public-key)
        #[arg(long)]
        hint: Option<String>,

        /// Password for an encrypted private key
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,

        /// Also record SHA-256 digests
        #[arg(long)]
        sha256: bool,

        /// Ship preview copies of the media
        #[arg(long)]
        preview: bool,

        /// Media files to include
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Verify a package signature
    Verify {
        package: PathBuf,

        /// Public key to verify against (default: the package's public.key)
        #[arg(long)]
        public_key: Option<PathBuf>,
    },

    /// Print a package document
    Inspect {
        package: PathBuf,

        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Check document structure, and file integrity when media is available
    Validate {
        package: PathBuf,

        /// Directory holding the original media files
        #[arg(long)]
        media_dir: Option<PathBuf>,
    },

    /// Show the effective configuration and the layers it came from
    Config {
        /// Print one value by dotted path, e.g. hash.include_sha256
        #[arg(long)]
        get: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config;

    match cli.command {
        Commands::Keygen {
            out_dir,
            name,
            bits,
            password,
        } => {
            let overrides = override_layer([("key_size_bits", bits.map(Value::from))]);
            let settings = load_settings(config_path.as_deref(), overrides);
            run_keygen(&settings, &out_dir, &name, password.as_deref());
        }
        Commands::Pack {
            name,
            publisher,
            output,
            key,
            public_key,
            signer,
            hint,
            password,
            sha256,
            preview,
            files,
        } => {
            let overrides = override_layer([
                ("hash.include_sha256", sha256.then_some(Value::Bool(true))),
                ("artifacts.preview_media", preview.then_some(Value::Bool(true))),
                ("signing.signer", signer.map(Value::from)),
                ("signing.public_key_hint", hint.map(Value::from)),
            ]);
            let settings = load_settings(config_path.as_deref(), overrides);

            let mut collection = MediaCollection::new(name);
            if let Some(publisher) = publisher {
                collection = collection.with_publisher(publisher);
            }
            for file in files {
                if !file.is_file() {
                    eprintln!("Not a file: {}", file.display());
                    process::exit(1);
                }
                collection = collection.with_entry(MediaEntry::from_path(file));
            }

            let output = if output.extension().is_none() {
                output.with_extension(PACKAGE_EXTENSION)
            } else {
                output
            };

            run_pack(
                &settings,
                &MedidDocument::new(collection),
                &output,
                key.as_deref(),
                public_key.as_deref(),
                password.as_deref(),
            );
        }
        Commands::Verify {
            package,
            public_key,
        } => {
            let settings = load_settings(config_path.as_deref(), None);
            run_verify(&settings, &package, public_key.as_deref());
        }
        Commands::Inspect { package, json } => {
            let settings = load_settings(config_path.as_deref(), None);
            run_inspect(&settings, &package, json);
        }
        Commands::Validate { package, media_dir } => {
            let settings = load_settings(config_path.as_deref(), None);
            run_validate(&settings, &package, media_dir.as_deref());
        }
        Commands::Config { get } => {
            let config = load_config(config_path.as_deref(), None);
            match render_config(&config, get.as_deref()) {
                Ok(output) => println!("{}", output),
                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(1);
                }
            }
        }
    }
}

/// Build a CLI override layer from dotted keys, skipping unset flags
fn override_layer<const N: usize>(flags: [(&str, Option<Value>); N]) -> Option<Value> {
    let mut root = Value::Object(Map::new());
    for (path, value) in flags {
        let Some(value) = value else { continue };
        let nested = path.rsplit('.').fold(value, |inner, key| {
            let mut table = Map::new();
            table.insert(key.to_string(), inner);
            Value::Object(table)
        });
        merge_into(&mut root, nested);
    }

    root.as_object()
        .is_some_and(|table| !table.is_empty())
        .then_some(root)
}

fn load_settings(config_path: Option<&Path>, overrides: Option<Value>) -> MedidSettings {
    load_config(config_path, overrides).settings
}

fn load_config(config_path: Option<&Path>, overrides: Option<Value>) -> EffectiveConfig {
    let path = config_path.map(Path::to_path_buf).or_else(default_config_path);

    if let Some(explicit) = config_path {
        if !explicit.exists() {
            eprintln!("Config file not found: {}", explicit.display());
            process::exit(1);
        }
    }

    match EffectiveConfig::build(path.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    }
}

/// The whole effective config with its sources, or a single value
fn render_config(config: &EffectiveConfig, get: Option<&str>) -> Result<String, String> {
    match get {
        Some(path) => match config.get(path) {
            Some(Value::String(text)) => Ok(text.clone()),
            Some(value) => Ok(value.to_string()),
            None => Err(format!("No config value at {}", path)),
        },
        None => config
            .to_json()
            .map_err(|e| format!("Error serializing output: {}", e)),
    }
}

fn read_file(path: &Path, what: &str) -> Vec<u8> {
    match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {} {}: {}", what, path.display(), e);
            process::exit(1);
        }
    }
}

fn run_keygen(settings: &MedidSettings, out_dir: &Path, name: &str, password: Option<&str>) {
    eprintln!("Generating {}-bit RSA key pair...", settings.key_size_bits);

    let keys: KeyPair = match crypto::generate_keypair(settings.key_size_bits) {
        Ok(keys) => keys,
        Err(e) => {
            eprintln!("Key generation failed: {}", e);
            process::exit(1);
        }
    };

    let private_bytes: Vec<u8> = match password {
        Some(password) => match crypto::encrypt(&keys.private_key, password) {
            Ok(blob) => blob,
            Err(e) => {
                eprintln!("Key encryption failed: {}", e);
                process::exit(1);
            }
        },
        None => keys.private_key.to_vec(),
    };

    let private_path = out_dir.join(format!("{}.key", name));
    let public_path = out_dir.join(format!("{}.pub", name));
    let written = fs::create_dir_all(out_dir)
        .and_then(|_| fs::write(&private_path, &private_bytes))
        .and_then(|_| fs::write(&public_path, &keys.public_key));
    if let Err(e) = written {
        eprintln!("Error writing key files: {}", e);
        process::exit(1);
    }

    eprintln!(
        "Private key: {}{}",
        private_path.display(),
        if password.is_some() { " (encrypted)" } else { "" }
    );
    eprintln!("Public key:  {}", public_path.display());
    println!("{}", keys.fingerprint());
}

fn run_pack(
    settings: &MedidSettings,
    document: &MedidDocument,
    output: &Path,
    key: Option<&Path>,
    public_key: Option<&Path>,
    password: Option<&str>,
) {
    let mut options: SaveOptions = settings.save_options();

    if let Some(path) = public_key {
        let public_key = read_file(path, "public key");
        if options.public_key_hint.is_none() {
            options.public_key_hint = Some(crypto::key_fingerprint(&public_key));
        }
        options.public_key = Some(public_key);
    }

    if let Some(path) = key {
        let raw = Zeroizing::new(read_file(path, "private key"));
        let private_key = match password {
            Some(password) => match crypto::decrypt(&raw, password) {
                Ok(der) => der,
                Err(e) => {
                    eprintln!("Cannot decrypt {}: {}", path.display(), e);
                    process::exit(1);
                }
            },
            None => raw,
        };

        if options.signer_name.is_none() {
            eprintln!("--signer (or signing.signer in config) is required with --key");
            process::exit(2);
        }
        options.private_key = Some(private_key);
    }

    match settings.assembler().try_save(document, output, &options) {
        Ok(saved) => {
            eprintln!(
                "Wrote {} ({} entries, {} bytes of media, {})",
                output.display(),
                saved.collection.entries.len(),
                saved.collection.total_length(),
                if saved.is_signed() { "signed" } else { "unsigned" }
            );
        }
        Err(errors) => {
            eprintln!("Package not written:");
            for error in errors {
                eprintln!("  - {}", error);
            }
            process::exit(1);
        }
    }
}

fn run_verify(settings: &MedidSettings, package: &Path, public_key: Option<&Path>) {
    let public_key = public_key.map(|path| read_file(path, "public key"));

    if settings.assembler().verify_package(package, public_key.as_deref()) {
        eprintln!("Signature valid: {}", package.display());
        process::exit(0);
    } else {
        eprintln!("Signature NOT valid: {}", package.display());
        process::exit(1);
    }
}

fn run_inspect(settings: &MedidSettings, package: &Path, as_json: bool) {
    let loaded = match settings.assembler().load(package) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading package: {}", e);
            process::exit(1);
        }
    };
    let document = &loaded.document;

    if as_json {
        match document.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let collection = &document.collection;
    println!("Collection: {}", collection.name);
    if let Some(publisher) = &collection.publisher {
        println!("Publisher:  {}", publisher);
    }
    println!("Created:    {}", collection.created.to_rfc3339());
    println!("Format:     {}", document.format_version);
    match &document.signature {
        Some(signature) => println!(
            "Signed by:  {}{} [{}]",
            signature.signer.as_deref().unwrap_or("<unnamed>"),
            signature
                .public_key_hint
                .as_deref()
                .map(|hint| format!(" (key {})", hint))
                .unwrap_or_default(),
            crypto::SIGNATURE_ALGORITHM
        ),
        None => println!("Signed by:  <unsigned>"),
    }
    if let Some(public_key) = &loaded.public_key {
        println!("Public key: {}", crypto::key_fingerprint(public_key));
    }
    println!();
    for entry in &collection.entries {
        println!(
            "  {:<32} {:>12}  {:<24} {}",
            entry.filename, entry.length_in_bytes, entry.mime_type, entry.hash
        );
    }
}

fn run_validate(settings: &MedidSettings, package: &Path, media_dir: Option<&Path>) {
    let loaded = match settings.assembler().load(package) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading package: {}", e);
            process::exit(1);
        }
    };

    let mut problems: Vec<String> = validate(&loaded.document)
        .iter()
        .map(ToString::to_string)
        .collect();

    if let Some(dir) = media_dir {
        match verify_entries(&loaded.document, dir) {
            Ok(errors) => problems.extend(errors.iter().map(ToString::to_string)),
            Err(e) => {
                eprintln!("Error reading media: {}", e);
                process::exit(1);
            }
        }
    }

    if problems.is_empty() {
        eprintln!("Valid: {}", package.display());
        process::exit(0);
    }

    let report = json!({ "package": package.display().to_string(), "problems": problems });
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
    process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_nest_dotted_keys() {
        let value = override_layer([
            ("key_size_bits", Some(Value::from(4096))),
            ("signing.signer", Some(Value::from("Alice"))),
            ("signing.public_key_hint", Some(Value::from("abc"))),
            ("hash.include_sha256", None),
        ])
        .unwrap();

        assert_eq!(
            value,
            json!({
                "key_size_bits": 4096,
                "signing": {"signer": "Alice", "public_key_hint": "abc"}
            })
        );
    }

    #[test]
    fn test_overrides_all_unset() {
        assert!(override_layer([("key_size_bits", None)]).is_none());
    }

    #[test]
    fn test_render_single_value() {
        let cli = json!({"signing": {"signer": "Alice"}});
        let config = EffectiveConfig::build(None, Some(cli)).unwrap();

        assert_eq!(render_config(&config, Some("signing.signer")).unwrap(), "Alice");
        assert_eq!(render_config(&config, Some("key_size_bits")).unwrap(), "2048");
        assert!(render_config(&config, Some("signing.missing")).is_err());
    }

    #[test]
    fn test_render_whole_config_lists_sources() {
        let cli = json!({"hash": {"include_sha256": true}});
        let config = EffectiveConfig::build(None, Some(cli)).unwrap();

        let rendered: Value = serde_json::from_str(&render_config(&config, None).unwrap()).unwrap();
        assert_eq!(rendered["config"]["hash"]["include_sha256"], true);
        assert_eq!(rendered["sources"][0]["origin"], "builtin");
        assert_eq!(rendered["sources"][1]["origin"], "cli");
        assert!(rendered["created_at"].is_string());
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
