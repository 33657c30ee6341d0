use crate::error::{format_bytes, DecompackError, UserFriendlyError};
use crate::pipeline::{InputStatus, RunPlan, RunReport, Topology};
use crate::ui::progress::format_duration;
use console::{style, Emoji, Term};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let term = Term::stdout();
        let use_colors = match mode {
            OutputMode::Human => term.features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &DecompackError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => eprintln!("SUGGESTION: {}", suggestion),
            }
        }
    }

    pub fn print_run_report(&self, report: &RunReport) {
        match self.mode {
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            _ if self.quiet => {}
            OutputMode::Human => self.print_human_report(report),
            OutputMode::Plain => self.print_plain_report(report),
        }
    }

    pub fn print_run_plan(&self, plan: &RunPlan) {
        match self.mode {
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(plan).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            _ => {
                self.print_header("Dry run: nothing will be extracted");
                println!("Input directory: {}", plan.input_directory.display());
                println!("Topology:        {}", topology_name(plan.topology));
                println!("Extractor:       {}", plan.config_used.extractor);
                println!(
                    "Archives:        up to {} files each",
                    plan.config_used.files_per_archive
                );
                println!(
                    "Bundle ceiling:  {}",
                    format_bytes(plan.config_used.max_bundle_bytes)
                );
                println!();
                println!("Inputs ({}):", plan.inputs.len());
                for input in &plan.inputs {
                    println!("  {}", input.display());
                }
                println!("Output areas:");
                for area in &plan.output_areas {
                    let marker = if area.exists { " (exists)" } else { "" };
                    println!("  {}{}", area.path.display(), marker);
                }
                self.print_separator();
            }
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "header",
                    "title": title
                }));
            }
            OutputMode::Plain => println!("=== {} ===", title),
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => println!("{}", "-".repeat(60)),
            OutputMode::Json => {}
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Success => (CHECKMARK, Box::new(|msg| style(msg).green().bold())),
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, color_fn(message)),
                _ => println!("{}{}", emoji, color_fn(message)),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn highlight(&self, value: impl ToString) -> String {
        if self.use_colors {
            style(value.to_string()).cyan().bold().to_string()
        } else {
            value.to_string()
        }
    }

    fn print_human_report(&self, report: &RunReport) {
        println!();
        self.print_separator();

        let headline = if report.cancelled {
            "Run cancelled"
        } else if report.has_failures() {
            "Run completed with extraction failures"
        } else {
            "Run completed"
        };

        if self.use_colors {
            let styled = if report.cancelled || report.has_failures() {
                style(headline).yellow().bold()
            } else {
                style(headline).green().bold()
            };
            println!("{} {}", styled, CHECKMARK);
        } else {
            println!("✓ {}", headline);
        }

        println!();
        println!("  Topology:        {}", topology_name(report.topology));
        println!(
            "  Inputs:          {} done, {} failed, {} skipped",
            self.highlight(report.succeeded()),
            self.highlight(report.failed()),
            self.highlight(report.skipped())
        );
        println!("  Files extracted: {}", self.highlight(report.total_files()));
        if report.topology == Topology::Combined {
            println!("  Bundles:         {}", self.highlight(report.combined_bundles));
        }
        println!("  Archives:        {}", self.highlight(report.total_archives()));
        println!(
            "  Time taken:      {}",
            self.highlight(format_duration(report.duration))
        );

        if !report.output_areas.is_empty() {
            println!();
            println!("  Output:");
            for area in &report.output_areas {
                println!("    {}", area.display());
            }
        }

        let failures: Vec<_> = report
            .inputs
            .iter()
            .filter(|o| o.status == InputStatus::ExtractFailed)
            .collect();
        if !failures.is_empty() {
            println!();
            println!("  Failed inputs:");
            for outcome in failures {
                println!(
                    "    {}: {}",
                    outcome.input,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
        }

        self.print_separator();
    }

    fn print_plain_report(&self, report: &RunReport) {
        if report.cancelled {
            println!("CANCELLED: {} run", topology_name(report.topology));
        } else {
            println!("COMPLETED: {} run", topology_name(report.topology));
        }
        println!("Inputs done: {}", report.succeeded());
        println!("Inputs failed: {}", report.failed());
        println!("Inputs skipped: {}", report.skipped());
        println!("Files extracted: {}", report.total_files());
        println!("Archives: {}", report.total_archives());
        println!("Duration: {:?}", report.duration);

        for outcome in &report.inputs {
            if let Some(error) = &outcome.error {
                println!("FAILED: {}: {}", outcome.input, error);
            }
        }
    }
}

fn topology_name(topology: Topology) -> &'static str {
    match topology {
        Topology::Individual => "individual",
        Topology::Combined => "combined",
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}
