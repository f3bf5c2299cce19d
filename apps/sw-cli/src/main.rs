use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use sw_store::{AlwaysConfirm, Confirm, StoreError, StoreResult, WaveformStore};
use sw_waveform::{EditableWaveform, SourceType, Template, generators};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sw-cli")]
#[command(about = "stimwave CLI - edit stimulator waveforms in a signal database", long_about = None)]
struct Cli {
    /// Signal database to open (created with a template if missing)
    #[arg(long, env = "STIMWAVE_SIGNALS", default_value = "signals.yaml", global = true)]
    location: PathBuf,
    /// Answer yes to every save/overwrite question
    #[arg(short, long, global = true)]
    yes: bool,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List waveforms in working order
    List,
    /// Print one waveform's arrays and timing
    Show {
        name: String,
    },
    /// Create a new waveform seeded by its source type's default generator
    New {
        name: String,
        /// 0 = stored (sine seed), 2 = square
        #[arg(long, default_value_t = 2)]
        source_type: u8,
    },
    /// Replace a waveform with one generated period of a square wave
    Square {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value_t = 0)]
        off: i32,
        #[arg(long, default_value_t = 4095)]
        on: i32,
        /// Period in microseconds
        #[arg(long)]
        period: u32,
        /// Fraction of the period spent high, in (0, 1)
        #[arg(long, default_value_t = 0.5)]
        pulse_width: f64,
    },
    /// Replace a waveform with a two-ramp triangle
    Triangle {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        left: i32,
        #[arg(long)]
        middle: i32,
        #[arg(long)]
        right: i32,
        #[arg(long)]
        left_units: usize,
        #[arg(long)]
        right_units: usize,
        /// Hold time per sample in microseconds
        #[arg(long)]
        resolution: u32,
    },
    /// Replace a waveform with sampled sine values
    Sine {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value_t = 0.0)]
        start: f64,
        #[arg(long, default_value_t = std::f64::consts::TAU)]
        end: f64,
        #[arg(long, default_value_t = 2047.0)]
        scale: f64,
        #[arg(long, default_value_t = 2048.0)]
        offset: f64,
        #[arg(long)]
        units: usize,
        /// Hold time per sample in microseconds
        #[arg(long)]
        resolution: u32,
    },
    /// Apply in-place edits, in the order listed below
    Edit {
        name: String,
        #[arg(long)]
        scale_time: Option<f64>,
        #[arg(long)]
        scale_voltage: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<i32>,
        #[arg(long)]
        invert: bool,
    },
    /// Import records from the old five-line text format
    ImportLegacy {
        path: PathBuf,
    },
    /// Rewrite a database with float-corrupted arrays as integers
    Repair {
        input: PathBuf,
        output: PathBuf,
    },
}

#[derive(Args)]
struct Target {
    /// Waveform to overwrite
    name: String,
    /// Create the waveform first if it does not exist
    #[arg(long)]
    create: bool,
}

/// Interactive prompts on stdin.
struct TerminalConfirm;

impl TerminalConfirm {
    fn ask(question: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        print!("{question} {hint} >> ");
        let _ = io::stdout().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return default;
        }
        match answer.trim().to_ascii_lowercase().as_str() {
            "" => default,
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        }
    }
}

impl Confirm for TerminalConfirm {
    fn confirm_persist(&mut self, name: &str) -> bool {
        Self::ask(&format!("Save changes to `{name}`?"), true)
    }

    fn confirm_overwrite(&mut self, path: &Path) -> bool {
        Self::ask(&format!("Overwrite {}?", path.display()), false)
    }
}

fn main() -> StoreResult<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AlwaysConfirm)
    } else {
        Box::new(TerminalConfirm)
    };

    match cli.command {
        Commands::List => cmd_list(&cli.location),
        Commands::Show { name } => cmd_show(&cli.location, &name),
        Commands::New { name, source_type } => {
            cmd_new(&cli.location, &name, source_type, confirm.as_mut())
        }
        Commands::Square {
            target,
            off,
            on,
            period,
            pulse_width,
        } => {
            let template = generators::square(off, on, period, pulse_width)?;
            cmd_apply(&cli.location, &target, SourceType::Square, template, confirm.as_mut())
        }
        Commands::Triangle {
            target,
            left,
            middle,
            right,
            left_units,
            right_units,
            resolution,
        } => {
            let template =
                generators::triangle(left, middle, right, left_units, right_units, resolution)?;
            cmd_apply(&cli.location, &target, SourceType::Stored, template, confirm.as_mut())
        }
        Commands::Sine {
            target,
            start,
            end,
            scale,
            offset,
            units,
            resolution,
        } => {
            let template = generators::sine(start, end, scale, offset, units, resolution)?;
            cmd_apply(&cli.location, &target, SourceType::Stored, template, confirm.as_mut())
        }
        Commands::Edit {
            name,
            scale_time,
            scale_voltage,
            offset,
            invert,
        } => cmd_edit(
            &cli.location,
            &name,
            EditOps {
                scale_time,
                scale_voltage,
                offset,
                invert,
            },
            confirm.as_mut(),
        ),
        Commands::ImportLegacy { path } => cmd_import(&cli.location, &path, confirm.as_mut()),
        Commands::Repair { input, output } => {
            let count = sw_project::repair_file(&input, &output)?;
            println!("✓ Rewrote {} waveforms to {}", count, output.display());
            Ok(())
        }
    }
}

fn cmd_list(location: &Path) -> StoreResult<()> {
    let store = WaveformStore::open(location)?;
    let names = store.list_names();
    if names.is_empty() {
        println!("No waveforms in {}", location.display());
        return Ok(());
    }

    println!("Waveforms in {}:", location.display());
    for name in names {
        if let Some(w) = store.get(&name) {
            println!(
                "  {} - {} ({} segments, {} us)",
                w.name(),
                w.source_type(),
                w.size(),
                w.period()
            );
        }
    }
    Ok(())
}

fn cmd_show(location: &Path, name: &str) -> StoreResult<()> {
    let store = WaveformStore::open(location)?;
    let w = lookup(&store, name)?;

    println!("{} ({})", w.name(), w.source_type());
    println!("  holdTime:       {:?}", w.hold_time());
    println!("  voltage:        {:?}", w.voltage());
    println!("  cumulativeTime: {:?}", w.cumulative_time());
    println!("  levelSequence:  {:?}", w.level_sequence());
    println!("  voltage range:  {} - {}", w.min_voltage(), w.max_voltage());
    println!("  period:         {} us", w.period());
    println!("  frequency:      {:.3} Hz", w.frequency()?);
    Ok(())
}

fn cmd_new(
    location: &Path,
    name: &str,
    source_type: u8,
    confirm: &mut dyn Confirm,
) -> StoreResult<()> {
    let source_type = SourceType::try_from(source_type)?;
    let mut store = WaveformStore::open(location)?;
    // A fresh waveform is clean; flag it so save offers it.
    store.create(name, source_type)?.mark_dirty();
    finish(&mut store, confirm)
}

fn cmd_apply(
    location: &Path,
    target: &Target,
    source_type: SourceType,
    template: Template,
    confirm: &mut dyn Confirm,
) -> StoreResult<()> {
    let mut store = WaveformStore::open(location)?;
    if target.create && store.get(&target.name).is_none() {
        store.create(&target.name, source_type)?;
    }
    let w = lookup_mut(&mut store, &target.name)?;
    w.apply_template(template)?;
    println!(
        "{}: {} segments, period {} us",
        w.name(),
        w.size(),
        w.period()
    );
    finish(&mut store, confirm)
}

struct EditOps {
    scale_time: Option<f64>,
    scale_voltage: Option<f64>,
    offset: Option<i32>,
    invert: bool,
}

fn cmd_edit(
    location: &Path,
    name: &str,
    ops: EditOps,
    confirm: &mut dyn Confirm,
) -> StoreResult<()> {
    let mut store = WaveformStore::open(location)?;
    let w = lookup_mut(&mut store, name)?;
    if let Some(factor) = ops.scale_time {
        w.scale_time(factor)?;
    }
    if let Some(factor) = ops.scale_voltage {
        w.scale_voltage(factor);
    }
    if let Some(offset) = ops.offset {
        w.offset_voltage(offset);
    }
    if ops.invert {
        w.invert();
    }
    finish(&mut store, confirm)
}

fn cmd_import(location: &Path, legacy: &Path, confirm: &mut dyn Confirm) -> StoreResult<()> {
    let mut store = WaveformStore::open(location)?;
    let count = store.import_legacy(legacy)?;
    println!("Imported {} waveforms from {}", count, legacy.display());
    finish(&mut store, confirm)
}

fn finish(store: &mut WaveformStore, confirm: &mut dyn Confirm) -> StoreResult<()> {
    if store.save(confirm)? {
        println!("✓ Saved {}", store.path().display());
    } else {
        println!("Nothing saved");
    }
    Ok(())
}

fn lookup<'a>(store: &'a WaveformStore, name: &str) -> StoreResult<&'a EditableWaveform> {
    store.get(name).ok_or_else(|| StoreError::UnknownWaveform {
        name: name.to_string(),
    })
}

fn lookup_mut<'a>(
    store: &'a mut WaveformStore,
    name: &str,
) -> StoreResult<&'a mut EditableWaveform> {
    store.get_mut(name).ok_or_else(|| StoreError::UnknownWaveform {
        name: name.to_string(),
    })
}
