use std::process::ExitCode;

use log::debug;

use classgazer::cli::Cli;
use classgazer::classfile::ClassFileParser;
use classgazer::error::AppError;
use classgazer::interpreter::Vm;
use classgazer::io::read_class_file;
use classgazer::print::{classfile_to_json, print_classfile};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let filter = if cli.debug {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    debug!("reading {}", cli.path.display());
    let bytes = read_class_file(&cli.path)?;
    let class_file = ClassFileParser::parse(&bytes)?;

    if cli.run || cli.debug {
        let mut vm = Vm::new(&class_file);
        let result = vm.run_main()?;
        println!("{result:?}");
        return Ok(());
    }

    if cli.reader_mode {
        return Ok(());
    }

    if cli.json {
        println!("{}", classfile_to_json(&class_file, cli.no_code)?);
    } else {
        print_classfile(&class_file, cli.no_code);
    }

    Ok(())
}
