//! Stego CLI binary.
//!
//! In-path prompt compression for LLM API traffic.
//!
//! # Commands
//!
//! - `compress` - Compress prompt text with the dictionary
//! - `decompress` - Restore compressed text
//! - `detect` - Show which API schema a URL belongs to
//! - `rewrite` - Run a request/response body through the pipeline
//! - `serve` - Start the admin HTTP API
//! - `config` - Print the effective configuration

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use stego::{
    proxy::Outcome,
    schema::{SchemaDescriptor, SchemaRegistry},
    server::{Server, ServerConfig},
    Config, Interceptor, StegoEngine, VERSION,
};

#[derive(Parser)]
#[command(name = "stego")]
#[command(version = VERSION)]
#[command(about = "Stego - reversible prompt compression for LLM API traffic", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/stego/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress prompt text
    Compress {
        /// Text input (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Extra custom rules JSON file
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Strategy name (dictionary, learned)
        #[arg(long)]
        strategy: Option<String>,

        /// Show compression statistics
        #[arg(short, long)]
        stats: bool,
    },

    /// Decompress text produced by `compress`
    Decompress {
        /// Text input (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Extra custom rules JSON file
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Strategy name (dictionary, learned)
        #[arg(long)]
        strategy: Option<String>,
    },

    /// Detect the API schema of a URL
    Detect {
        /// Request URL
        url: String,
    },

    /// Run a JSON body through the interception pipeline
    Rewrite {
        /// Request URL the body belongs to
        #[arg(short, long)]
        url: String,

        /// Body file (default: stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Treat the body as a response
        #[arg(long)]
        response: bool,

        /// Extra custom rules JSON file
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Start the admin HTTP API
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        (Commands::Serve { .. }, false) => "info",
        _ => "warn",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Compress {
            input,
            file,
            output,
            rules,
            strategy,
            stats,
        } => cmd_compress(&config, input, file, output, rules, strategy, stats),

        Commands::Decompress {
            input,
            file,
            output,
            rules,
            strategy,
        } => cmd_decompress(&config, input, file, output, rules, strategy),

        Commands::Detect { url } => cmd_detect(&config, &url),

        Commands::Rewrite {
            url,
            file,
            output,
            response,
            rules,
        } => cmd_rewrite(&config, &url, file, output, response, rules),

        Commands::Serve { host, port } => cmd_serve(config, host, port),

        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        },
    }
}

fn build_engine(
    config: &Config,
    rules: Option<PathBuf>,
    strategy: Option<String>,
) -> anyhow::Result<StegoEngine> {
    let engine = StegoEngine::from_config(&config.compression, &config.custom_rules);

    if let Some(path) = rules {
        engine.reload_dictionary(path)?;
    }
    if let Some(name) = strategy {
        engine.select_strategy(&name);
    }

    Ok(engine)
}

fn cmd_compress(
    config: &Config,
    input: Option<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    rules: Option<PathBuf>,
    strategy: Option<String>,
    stats: bool,
) -> anyhow::Result<()> {
    let content = read_input(input, file)?;
    let engine = build_engine(config, rules, strategy)?;

    let compressed = engine.compress(&content);
    write_output(output, &compressed)?;

    if stats {
        let original = content.len();
        let result = compressed.len();

        eprintln!();
        eprintln!("Compression Statistics:");
        eprintln!("  Strategy:     {}", engine.active_strategy());
        eprintln!("  Rules:        {}", engine.table().len());
        eprintln!("  Original:     {original} bytes");
        eprintln!("  Compressed:   {result} bytes");

        let savings = original as i64 - result as i64;
        let pct = if original > 0 {
            (savings as f64 / original as f64) * 100.0
        } else {
            0.0
        };
        eprintln!("  Saved:        {savings} bytes ({pct:.1}%)");
    }

    Ok(())
}

fn cmd_decompress(
    config: &Config,
    input: Option<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    rules: Option<PathBuf>,
    strategy: Option<String>,
) -> anyhow::Result<()> {
    let content = read_input(input, file)?;
    let engine = build_engine(config, rules, strategy)?;

    write_output(output, &engine.decompress(&content))
}

fn cmd_detect(config: &Config, url: &str) -> anyhow::Result<()> {
    let registry = SchemaRegistry::from_config(&config.api_compat);

    match registry.detect(url) {
        Some(id) => {
            let descriptor = SchemaDescriptor::builtin(id);
            println!("{id}");
            eprintln!("  Request text:  {:?}", descriptor.request_text);
            eprintln!("  Response text: {:?}", descriptor.response_text);
            Ok(())
        },
        None => {
            println!("none");
            std::process::exit(1);
        },
    }
}

fn cmd_rewrite(
    config: &Config,
    url: &str,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    response: bool,
    rules: Option<PathBuf>,
) -> anyhow::Result<()> {
    let body = read_bytes(file.as_deref())?;

    let interceptor = Interceptor::from_config(config);
    if let Some(path) = rules {
        interceptor.engine().reload_dictionary(path)?;
    }

    let result = if response {
        interceptor.on_response(url, body)
    } else {
        interceptor.on_request(url, body)
    };

    match output {
        Some(path) => std::fs::write(path, &result.body)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&result.body)?;
            stdout.write_all(b"\n")?;
        },
    }

    match &result.outcome {
        Outcome::Rewritten {
            schema,
            original_len,
            rewritten_len,
        } => eprintln!("Rewritten ({schema}): text {original_len} -> {rewritten_len} bytes"),
        Outcome::PassThrough { reason } => eprintln!("Passed through: {reason}"),
    }
    eprintln!("Content-Length: {}", result.content_length);

    Ok(())
}

fn cmd_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.admin.host = host;
    }
    if let Some(port) = port {
        config.admin.port = port;
    }

    let server_config = ServerConfig::from_config(&config)?;
    let interceptor = Arc::new(Interceptor::from_config(&config));
    let server = Server::new(server_config, interceptor);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.run())?;
    Ok(())
}

fn read_input(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(path) = file {
        Ok(std::fs::read_to_string(path)?)
    } else if let Some(s) = input.filter(|s| s != "-") {
        Ok(s)
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        // Drop the newline a shell pipe adds
        let trimmed = buffer.trim_end_matches(['\r', '\n']).len();
        buffer.truncate(trimmed);
        Ok(buffer)
    }
}

fn read_bytes(file: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match file {
        Some(path) => Ok(std::fs::read(path)?),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        },
    }
}

fn write_output(output: Option<PathBuf>, content: &str) -> anyhow::Result<()> {
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}
