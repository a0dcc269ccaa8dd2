use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use photobooth::config::BoothConfig;
use photobooth::prompt::{enhancement_user_message, expand_details};
use photobooth::{
    BoothError, ExtendOptions, HasRecoverySuggestion, PromptField, PromptForm, Retryable,
    WidescreenPreset,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Photobooth background generator:
/// - generate: prompt → square image → widescreen outpaint
/// - extend: widescreen outpaint of an existing square image
#[derive(Parser, Debug)]
#[command(name = "booth")]
#[command(about = "🖼️  Generate widescreen photobooth backgrounds with AI outpainting")]
#[command(long_about = "Generate widescreen photobooth backgrounds. A square image is generated from your prompt,
then its left and right edges are filled in by the image edit endpoint to reach the target width.")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new background from a prompt
    Generate {
        #[command(flatten)]
        prompt: PromptArgs,

        /// Skip the chat-model rewrite of the prompt
        #[arg(long)]
        no_enhance: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Extend an existing square image to widescreen
    Extend {
        /// Square image to extend (256, 512 or 1024 px)
        #[arg(short, long)]
        input: PathBuf,

        /// Prompt guiding the side fills
        #[arg(short, long)]
        prompt: String,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Preview the composed prompt without calling the provider
    Prompt {
        #[command(flatten)]
        prompt: PromptArgs,

        /// Also show the detailed phrasing and the enhancement request
        #[arg(long)]
        expand: bool,
    },
    /// List the preset buttons
    Presets,
}

#[derive(Args, Debug)]
struct PromptArgs {
    /// Where the scene takes place (guided mode)
    #[arg(long = "where", value_name = "PLACE")]
    place: Option<String>,

    /// What the picture shows (guided mode)
    #[arg(long = "what", value_name = "SUBJECT")]
    subject: Option<String>,

    /// Picture style (guided mode, defaults to "A 4k picture")
    #[arg(long)]
    style: Option<String>,

    /// Free-form prompt; overrides the guided fields
    #[arg(long, conflicts_with_all = ["place", "subject", "style"])]
    prompt: Option<String>,
}

impl PromptArgs {
    fn to_form(&self) -> PromptForm {
        match &self.prompt {
            Some(prompt) => PromptForm::free_form(prompt.clone()),
            None => {
                let mut form = PromptForm::default();
                for (field, value) in [
                    (PromptField::Place, &self.place),
                    (PromptField::Subject, &self.subject),
                    (PromptField::Style, &self.style),
                ] {
                    if let Some(value) = value {
                        form.set(field, value.trim());
                    }
                }
                form
            }
        }
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Widescreen aspect ratio
    #[arg(short, long, value_enum, default_value = "16:9")]
    aspect: WidescreenPreset,

    /// Exact target width in pixels; overrides --aspect. For `extend` it is
    /// checked against the input image's side.
    #[arg(long)]
    target_width: Option<u32>,

    /// Directory for the PNG and JSON metadata
    #[arg(short, long, env = "BOOTH_OUTPUT_DIR")]
    output_dir: Option<String>,

    /// API key (defaults to IMAGE_GENERATOR_API_KEY, then OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl OutputArgs {
    /// Everything except `--target-width`, which each command applies itself.
    fn apply(&self, config: BoothConfig) -> BoothConfig {
        let mut config = config.with_aspect(self.aspect);
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(key) = &self.api_key {
            config.api_key = key.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Generate {
            prompt,
            no_enhance,
            output,
        } => {
            let mut config = output.apply(BoothConfig::from_env());
            if let Some(width) = output.target_width {
                config.target_width = width;
            }
            config.enhance_prompt = !no_enhance;
            config.validate()?;

            let form = prompt.to_form();
            let (background, path) = photobooth::generate_background(config, &form)
                .await
                .map_err(explain)?;
            println!("Prompt: {}", background.prompt);
            if let Some(enhanced) = &background.enhanced_prompt {
                println!("Enhanced prompt: {}", enhanced);
            }
            println!(
                "Saved {}x{} background to {}",
                background.image.width(),
                background.image.height(),
                path.display()
            );
        }
        Command::Extend {
            input,
            prompt,
            output,
        } => {
            let config = output.apply(BoothConfig::from_env());
            config.validate()?;

            let path = photobooth::extend_file(ExtendOptions {
                input: input.clone(),
                prompt,
                target_width: output.target_width,
                config,
            })
            .await
            .map_err(explain)
            .with_context(|| format!("failed to extend {}", input.display()))?;
            println!("Saved extended background to {}", path.display());
        }
        Command::Prompt { prompt, expand } => {
            let form = prompt.to_form();
            match form.final_prompt() {
                Ok(composed) => {
                    println!("{}", composed);
                    if expand {
                        let detailed = expand_details(&composed);
                        println!("\nDetailed: {}", detailed);
                        println!("\nEnhancement request:{}", enhancement_user_message(&detailed));
                    }
                }
                Err(_) => println!(
                    "{}",
                    form.status()
                        .message()
                        .unwrap_or("Nothing entered yet; pass --where, --what, --style or --prompt")
                ),
            }
        }
        Command::Presets => {
            for field in [PromptField::Place, PromptField::Subject, PromptField::Style] {
                println!("{}:", field.label());
                for preset in field.presets() {
                    println!("  - {}", preset);
                }
            }
        }
    }
    Ok(())
}

/// Install the fmt subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "photobooth=info",
        1 => "photobooth=debug,booth=debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init();
}

/// Put the library's recovery hints above the error itself.
fn explain(error: BoothError) -> anyhow::Error {
    let mut hints = Vec::new();
    if error.is_content_rejection() {
        hints.push(
            "The provider's safety system rejected your prompt. Try again with something less saucy :)"
                .to_string(),
        );
    } else if let Some(suggestion) = error.recovery_suggestion() {
        hints.push(suggestion.to_string());
    }
    if let Some(delay_ms) = error.retry_delay_ms().filter(|_| error.is_retryable()) {
        hints.push(format!(
            "This is usually temporary; try again in about {}s",
            delay_ms.div_ceil(1000)
        ));
    }

    let error = anyhow::Error::new(error);
    if hints.is_empty() {
        error
    } else {
        error.context(hints.join("\n"))
    }
}
