use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{self, Command as Process};
use std::time::Instant;

use clap::{ArgAction, Args, Parser, Subcommand};
use log::{LevelFilter, debug, info};
use simple_logger::SimpleLogger;
use snafu::ResultExt;

use plang::error::{ReadSourceSnafu, SpawnAssemblerSnafu, WriteOutputSnafu};
use plang::{
  Ast, CodegenOptions, NodeId, PlangError, PlangResult, SyntaxReport, Tracer, VarArray, VmConfig,
  VmFault, codegen, dump, input, vm,
};

#[derive(Parser, Debug)]
#[command(name = "plang", version, about = "Checker, interpreter and compiler for the P language")]
struct Cli {
  /// Increase log verbosity (-v info, -vv debug, -vvv trace).
  #[arg(short, long, action = ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Check the syntax of a source file.
  Check { file: PathBuf },
  /// Print the syntax tree of a source file.
  Ast { file: PathBuf },
  /// Run a source file in the interpreter.
  Run {
    file: PathBuf,
    /// Dump the machine state and wait for ENTER at every loop step.
    #[arg(long, action = ArgAction::SetTrue)]
    debug: bool,
    /// Abort loops whose test variable does not change over an iteration.
    #[arg(long, action = ArgAction::SetTrue)]
    detect_loops: bool,
  },
  /// Write fasm assembly for a source file.
  Asm {
    file: PathBuf,
    #[command(flatten)]
    codegen: CodegenArgs,
    /// Output file (defaults to the source path with an `asm` extension).
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
  },
  /// Write fasm assembly and assemble it into an executable.
  Compile {
    file: PathBuf,
    #[command(flatten)]
    codegen: CodegenArgs,
    /// Assembler to invoke on the generated file.
    #[arg(long, value_name = "PATH", default_value = "fasm")]
    assembler: String,
  },
}

#[derive(Args, Debug)]
struct CodegenArgs {
  /// Disable code optimizations.
  #[arg(long, action = ArgAction::SetTrue)]
  no_opt: bool,
  /// Annotate the assembly with the source statements.
  #[arg(long, action = ArgAction::SetTrue)]
  comments: bool,
}

impl CodegenArgs {
  fn options(&self) -> CodegenOptions {
    CodegenOptions {
      optimize: !self.no_opt,
      source_comments: self.comments,
    }
  }
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  if let Err(err) = run(cli.command) {
    match &err {
      // Already reported in full on stdout.
      PlangError::Syntax { .. } | PlangError::Fault { .. } => {}
      _ => eprintln!("ERROR: {err}"),
    }
    process::exit(exit_code(&err));
  }
}

fn init_logging(verbose: u8) {
  let level = match verbose {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  };
  if let Err(err) = SimpleLogger::new().with_level(level).env().init() {
    eprintln!("could not initialise logging: {err}");
  }
}

fn exit_code(err: &PlangError) -> i32 {
  match err {
    PlangError::ReadSource { .. } | PlangError::WriteOutput { .. } | PlangError::Prompt { .. } => 1,
    PlangError::Syntax { .. } => 2,
    PlangError::Build { .. } => 3,
    PlangError::Fault { .. } => 4,
    PlangError::SpawnAssembler { .. } | PlangError::AssemblerFailed { .. } => 5,
  }
}

fn run(command: Command) -> PlangResult<()> {
  match command {
    Command::Check { file } => {
      let source = load_source(&file)?;
      let (_, report) = plang::check_source(&source);
      print_diagnostics(&report);
      if report.ok() {
        Ok(())
      } else {
        Err(PlangError::Syntax {
          errors: report.error_count(),
          warnings: report.warning_count(),
        })
      }
    }
    Command::Ast { file } => {
      let ast = load_program(&file)?;
      println!();
      print!("{}", dump::render_tree(&ast));
      Ok(())
    }
    Command::Run {
      file,
      debug,
      detect_loops,
    } => {
      let ast = load_program(&file)?;
      let config = VmConfig {
        debug,
        detect_infinite_loops: detect_loops,
      };
      run_vm(&ast, config)
    }
    Command::Asm {
      file,
      codegen,
      output,
    } => {
      let ast = load_program(&file)?;
      let output = output.unwrap_or_else(|| file.with_extension("asm"));
      write_assembly(&ast, codegen.options(), &output)
    }
    Command::Compile {
      file,
      codegen,
      assembler,
    } => {
      let ast = load_program(&file)?;
      let output = file.with_extension("asm");
      write_assembly(&ast, codegen.options(), &output)?;
      assemble(&assembler, &output)
    }
  }
}

fn load_source(path: &Path) -> PlangResult<String> {
  info!("source file: {}", path.display());
  fs::read_to_string(path).context(ReadSourceSnafu { path })
}

/// Load, check and build a program, printing any diagnostics on the way.
fn load_program(path: &Path) -> PlangResult<Ast> {
  let source = load_source(path)?;
  let (tokens, report) = plang::check_source(&source);
  print_diagnostics(&report);
  plang::build_checked(&tokens, &report)
}

fn print_diagnostics(report: &SyntaxReport) {
  if report.diagnostics.is_empty() {
    return;
  }

  println!();
  for diagnostic in &report.diagnostics {
    println!("{diagnostic}");
    println!("------------------------");
  }
  println!(
    "\n{} errors, {} warnings\n",
    report.error_count(),
    report.warning_count()
  );
}

fn run_vm(ast: &Ast, config: VmConfig) -> PlangResult<()> {
  if config.debug {
    println!("Debug mode enabled.");
  }

  let mut vars = VarArray::new();
  {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    input::prompt_inputs(ast, &mut vars, &mut stdin.lock(), &mut stdout)?;
  }

  println!("\nRunning program, please wait...");
  let start = Instant::now();
  let outcome = vm::execute_with(ast, &mut vars, config, &mut PauseTracer);
  let elapsed = start.elapsed();

  match outcome {
    Ok(result) => {
      if config.debug {
        println!("Done!");
      } else {
        println!("Done! Execution time: {} ms", elapsed.as_millis());
      }
      println!("\nResult: {result}\n");
      Ok(())
    }
    Err(fault) => {
      println!("\nERROR: {}", fault_banner(fault));
      print!("{}", dump::state_dump(ast, &vars));
      println!("\nVM state dump!");
      Err(PlangError::Fault { fault })
    }
  }
}

fn fault_banner(fault: VmFault) -> String {
  match fault {
    VmFault::InfiniteLoop { .. } => "Program got stuck in an infinite loop.".to_string(),
    VmFault::InvalidVariable { .. } => "Attempted to use an invalid variable.".to_string(),
    VmFault::Overflow { .. } => "A variable overflowed.".to_string(),
    VmFault::PrematureResult => "Premature RESULT node encountered.".to_string(),
    VmFault::MissingResult => fault.to_string(),
  }
}

/// Prints the machine state at every loop step and waits for ENTER.
struct PauseTracer;

impl Tracer for PauseTracer {
  fn loop_step(&mut self, ast: &Ast, node: NodeId, vars: &VarArray) {
    debug!("loop step at node {}", node.index());
    println!();
    print!("{}", dump::state_dump(ast, vars));

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    if let Err(err) = input::pause(&mut stdin.lock(), &mut stdout) {
      eprintln!("could not wait for input: {err}");
    }
  }
}

fn write_assembly(ast: &Ast, options: CodegenOptions, output: &Path) -> PlangResult<()> {
  if !options.optimize {
    println!("Code optimizations disabled.");
  }

  let asm = codegen::generate_with(ast, options);
  fs::write(output, asm).context(WriteOutputSnafu { path: output })?;
  info!("assembly written to {}", output.display());
  Ok(())
}

fn assemble(assembler: &str, asm_file: &Path) -> PlangResult<()> {
  println!();
  info!("running {assembler} {}", asm_file.display());

  let status = Process::new(assembler)
    .arg(asm_file)
    .status()
    .context(SpawnAssemblerSnafu { program: assembler })?;

  if status.success() {
    Ok(())
  } else {
    Err(PlangError::AssemblerFailed {
      program: assembler.to_string(),
      status,
    })
  }
}
