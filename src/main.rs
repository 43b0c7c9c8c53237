use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use bfork::bytecode::Program;
use bfork::bytecode::disasm::print_program;
use bfork::frontend::dumper::InstructionDumper;
use bfork::frontend::{ForkSyntax, Loader, LoaderConfig};
use bfork::runtime::{InputSplit, InstanceResult, RunReport, SchedulerConfig, TapeOverflow, VmConfig};
use bfork::{Config, Error};

#[derive(Parser)]
#[command(name = "bfork")]
#[command(about = "Tape-and-pointer interpreter with a cooperative FORK instruction", long_about = None)]
struct Cli {
    /// Program file (.bf or .b)
    file: PathBuf,

    /// Program input as text
    #[arg(long, conflicts_with = "input_file")]
    input: Option<String>,

    /// Read program input from a file
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// Run one VM without the scheduler (FORK is skipped)
    #[arg(long)]
    single: bool,

    /// Maximum simultaneously live instances
    #[arg(long, default_value_t = bfork::runtime::scheduler::DEFAULT_MAX_LIVE_INSTANCES)]
    max_instances: usize,

    /// Per-instance step budget (0 disables it)
    #[arg(long, default_value_t = bfork::runtime::vm::DEFAULT_MAX_STEPS)]
    step_limit: usize,

    /// Step budget for the whole run (0 disables it)
    #[arg(long, default_value_t = bfork::runtime::scheduler::DEFAULT_MAX_GLOBAL_STEPS)]
    global_step_limit: usize,

    /// Tape cells per instance
    #[arg(long, default_value_t = bfork::runtime::tape::DEFAULT_TAPE_CAPACITY)]
    tape_size: usize,

    #[arg(long, value_enum, default_value_t = OverflowArg::Reject)]
    overflow: OverflowArg,

    /// How pending input is divided at a fork
    #[arg(long, value_enum, default_value_t = SplitArg::Halve)]
    split: SplitArg,

    #[arg(long, value_enum, default_value_t = ForkSyntaxArg::Keyword)]
    fork_syntax: ForkSyntaxArg,

    /// Show filtered instructions only
    #[arg(long)]
    tokens: bool,

    #[arg(long)]
    no_color: bool,

    /// Print the program listing and exit
    #[arg(long)]
    disasm: bool,

    /// Write the postcard-encoded run report here
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[clap(rename_all = "kebab-case")]
enum OverflowArg {
    Reject,
    Clamp,
    Grow,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[clap(rename_all = "kebab-case")]
enum SplitArg {
    Halve,
    ParentKeeps,
    ChildTakes,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[clap(rename_all = "kebab-case")]
enum ForkSyntaxArg {
    Keyword,
    Letter,
    Both,
}

impl Cli {
    fn config(&self) -> Config {
        let limit = |n: usize| (n > 0).then_some(n);
        Config {
            loader: LoaderConfig {
                fork_syntax: match self.fork_syntax {
                    ForkSyntaxArg::Keyword => ForkSyntax::Keyword,
                    ForkSyntaxArg::Letter => ForkSyntax::Letter,
                    ForkSyntaxArg::Both => ForkSyntax::Both,
                },
            },
            scheduler: SchedulerConfig {
                max_live_instances: self.max_instances,
                max_global_steps: limit(self.global_step_limit),
                input_split: match self.split {
                    SplitArg::Halve => InputSplit::Halve,
                    SplitArg::ParentKeeps => InputSplit::ParentKeeps,
                    SplitArg::ChildTakes => InputSplit::ChildTakes,
                },
                vm: VmConfig {
                    tape_capacity: self.tape_size,
                    max_steps: limit(self.step_limit),
                    overflow: match self.overflow {
                        OverflowArg::Reject => TapeOverflow::Reject,
                        OverflowArg::Clamp => TapeOverflow::Clamp,
                        OverflowArg::Grow => TapeOverflow::Grow,
                    },
                },
            },
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        if let Some(partial) = e.partial() {
            if let Err(io_err) = print_report(partial) {
                eprintln!("error: {}", io_err);
            }
        }
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn ensure_extension(path: &Path) -> Result<(), Error> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("bf") | Some("b") => Ok(()),
        _ => Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("expected a .bf or .b file, got {}", path.display()),
        ))),
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    ensure_extension(&cli.file)?;
    let source = fs::read_to_string(&cli.file)?;
    let config = cli.config();

    if cli.tokens {
        let mut dumper = InstructionDumper::new();
        if cli.no_color {
            dumper = dumper.no_color();
        }
        dumper.dump(&Loader::with_config(&source, config.loader.clone()).filter());
        return Ok(());
    }

    if cli.disasm {
        print_program(&Program::load_with(&source, config.loader.clone())?);
        return Ok(());
    }

    let input = match (&cli.input, &cli.input_file) {
        (Some(text), _) => text.clone().into_bytes(),
        (None, Some(path)) => fs::read(path)?,
        (None, None) => Vec::new(),
    };

    let report = if cli.single {
        let result = bfork::execute_single(&source, &input, &config)?;
        RunReport {
            total_steps: result.steps,
            instances: vec![result],
            refused_forks: Vec::new(),
        }
    } else {
        bfork::execute(&source, &input, &config)?
    };

    print_report(&report)?;

    if let Some(path) = &cli.report {
        fs::write(path, report.to_bytes()?)?;
    }
    Ok(())
}

fn print_report(report: &RunReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, report)?;
    out.flush()
}

/// A lone instance that never forked prints its raw output; anything else
/// gets one line per instance.
fn write_report<W: Write>(out: &mut W, report: &RunReport) -> io::Result<()> {
    if let [only] = report.instances.as_slice() {
        if only.parent.is_none() && only.children.is_empty() {
            return out.write_all(&only.output);
        }
    }

    for result in &report.instances {
        write_instance(out, result)?;
    }
    for refusal in &report.refused_forks {
        writeln!(
            out,
            "fork refused: T{} at instruction {} ({} live, budget {})",
            refusal.instance, refusal.instruction_pointer, refusal.live, refusal.budget
        )?;
    }
    writeln!(out, "{} steps", report.total_steps)
}

fn write_instance<W: Write>(out: &mut W, result: &InstanceResult) -> io::Result<()> {
    let parent = result
        .parent
        .map(|p| format!("T{}", p))
        .unwrap_or_else(|| "-".to_string());
    let state = if result.halted { "halted" } else { "running" };
    writeln!(
        out,
        "T{} (parent {}, {}, ptr {}, {} steps): {:?}",
        result.id,
        parent,
        state,
        result.data_pointer,
        result.steps,
        result.output_lossy()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn report(source: &str) -> RunReport {
        bfork::execute(source, b"", &bfork::Config::default()).unwrap()
    }

    #[test]
    fn test_single_instance_writes_raw_output() {
        let mut out = Vec::new();
        write_report(&mut out, &report("++++++++[>++++++++<-]>+.")).unwrap();
        assert_eq!(out, b"A");
    }

    #[test]
    fn test_forked_run_lists_instances() {
        let mut out = Vec::new();
        write_report(&mut out, &report("FORK+.")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("T0 (parent -, halted"));
        assert!(text.contains("T1 (parent T0, halted"));
        assert!(text.ends_with("steps\n"));
    }

    #[test]
    fn test_write_errors_propagate() {
        let single = report("+.");
        let err = write_report(&mut BrokenPipe, &single).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let forked = report("FORK+.");
        assert!(write_report(&mut BrokenPipe, &forked).is_err());
    }

    #[test]
    fn test_ensure_extension() {
        assert!(ensure_extension(Path::new("hello.bf")).is_ok());
        assert!(ensure_extension(Path::new("hello.b")).is_ok());
        assert!(matches!(
            ensure_extension(Path::new("hello.txt")),
            Err(Error::Io(_))
        ));
    }
}
