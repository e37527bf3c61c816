//! `patitoc`: compiles a `.pat` source file and, by default, runs it,
//! printing the program's `cout` output to stdout.
//!
//! Thin wrapper the way `vasm`'s and `vex`'s CLIs are thin wrappers
//! around their library crates: all compiling and executing happens in
//! `patito_compiler`/`patito_vm`; this binary only reads the file,
//! reports diagnostics/errors, and picks an exit code (spec §6: "Success
//! = 0; compile error = non-zero; runtime error... = non-zero").

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "patitoc")]
#[command(about = "Compiles and runs Patito (.pat) programs", long_about = None)]
#[command(version)]
struct Cli {
    /// Patito source file to compile and run.
    source: PathBuf,

    /// Print the variable table, constant table, and quadruple list
    /// before execution (mirrors the original `print_intermediate_code`
    /// flag in original_source/Scanner_Parser_Patito.py).
    #[arg(long)]
    print_ir: bool,

    /// After execution, print every cell of the VM's flat memory image
    /// (mirrors `Virtual_Machine.print_memory` in
    /// original_source/Virtual_Machine.py).
    #[arg(long)]
    dump_memory: bool,
}

const EXIT_COMPILE_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let source = match std::fs::read_to_string(&cli.source) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("reading {}: {}", cli.source.display(), err);
            return ExitCode::from(EXIT_COMPILE_ERROR);
        }
    };

    let (output, diagnostics) = match patito_compiler::compile(&source) {
        Ok(result) => result,
        Err((err, diagnostics)) => {
            for diagnostic in diagnostics.iter() {
                eprintln!("warning: {}", diagnostic);
            }
            eprintln!("{}", err);
            return ExitCode::from(EXIT_COMPILE_ERROR);
        }
    };

    for diagnostic in diagnostics.iter() {
        eprintln!("warning: {}", diagnostic);
    }

    if cli.print_ir {
        print_ir(&output);
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    if cli.dump_memory {
        match patito_vm::execute_with_memory(&output, &mut handle) {
            Ok(memory) => {
                print_memory(&memory);
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("{}", err);
                ExitCode::from(EXIT_RUNTIME_ERROR)
            }
        }
    } else {
        match patito_vm::execute(&output, &mut handle) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{}", err);
                ExitCode::from(EXIT_RUNTIME_ERROR)
            }
        }
    }
}

fn print_ir(output: &patito_vm::CompileOutput) {
    println!("-- VARIABLES TABLE --");
    for (name, ty, address) in output.variables.iter_resolved() {
        println!("{:<12} {:<6} {}", name, ty, address.to_raw());
    }
    println!();

    println!("-- CONSTANTS TABLE --");
    for (address, value) in output.constants.iter() {
        println!("{:<6} {:?}", address.to_raw(), value);
    }
    println!();

    println!("-- QUADRUPLES GENERATED --");
    for (index, quad) in output.quadruples.iter().enumerate() {
        println!("{} {}", index, quad);
    }
    println!();
}

fn print_memory(memory: &patito_vm::memory::Memory) {
    for (index, cell) in memory.cells().iter().enumerate() {
        println!("Memory[{}] = {}", index, cell);
    }
}
