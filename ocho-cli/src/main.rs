//! Entrypoint for the headless runner.
use std::{env, error::Error, fs, process, time::Instant};

use log::{error, info, warn};
use ocho::prelude::*;

mod clock;

use clock::{Clock, Hz};

static USAGE: &str = r#"
usage: ocho CMD [OPTIONS] FILE

commands:
    run     Interpret the target ROM file
    dis     Disassemble the target ROM into readable mnemonics

options for run:
    --hz N      Pace the machine at N cycles per second (default: unthrottled)
    --steps N   Stop after N cycles (default: 1000000)

examples:
    ocho run breakout.rom
    ocho run --hz 700 breakout.rom
    ocho dis breakout.rom
"#;

struct RunOpts {
    filepath: String,
    hz: Hz,
    steps: usize,
}

enum Cmd {
    Run(RunOpts),
    Dis { filepath: String },
}

fn run_program(opts: &RunOpts) -> Result<(), Box<dyn Error>> {
    let program = fs::read(&opts.filepath)?;

    let mut vm = OchoVm::new();
    vm.load_program(&program)?;

    info!("loaded {} bytes from {}", program.len(), opts.filepath);

    let mut clock = Clock::new(opts.hz);
    let started = Instant::now();
    let mut cycles = 0_usize;
    let mut frames = 0_usize;

    while cycles < opts.steps {
        clock.wait();

        let cycle = match vm.step() {
            Ok(cycle) => cycle,
            Err(err) => {
                error!("machine fault after {cycles} cycles: {err}");
                println!("{}", vm.dump_registers()?);
                return Err(err.into());
            }
        };
        cycles += 1;

        if cycle.tone {
            // stand-in for an audio sink
            info!("beep");
        }

        if vm.redraw() {
            frames += 1;
            vm.clear_redraw();
        }

        if cycle.flow == Flow::KeyWait {
            // No input source is attached to a headless run, so a machine
            // waiting for a key can never resume.
            warn!("machine is waiting for a keypress; stopping");
            break;
        }
    }

    let elapsed = started.elapsed();
    println!(
        "ran {cycles} cycles ({frames} frames) in {}ms",
        elapsed.as_nanos() as f64 / 1_000_000.0
    );
    println!("{}", vm.dump_display()?);

    Ok(())
}

fn dis_program(filepath: &str) -> Result<(), Box<dyn Error>> {
    let program = fs::read(filepath)?;

    let mut buf = String::new();
    Disassembler::new(&program).disassemble(&mut buf)?;
    print!("{buf}");

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    match parse_args() {
        Some(Cmd::Run(opts)) => run_program(&opts)?,
        Some(Cmd::Dis { filepath }) => dis_program(&filepath)?,
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            process::exit(64)
        }
    }

    Ok(())
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);

    match args.next()?.as_str() {
        "run" => {
            let mut opts = RunOpts {
                filepath: String::new(),
                hz: Hz(0),
                steps: 1_000_000,
            };

            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--hz" => opts.hz = Hz(parse_num(args.next())?),
                    "--steps" => opts.steps = parse_num(args.next())? as usize,
                    _ => opts.filepath = arg,
                }
            }

            if opts.filepath.is_empty() {
                return None;
            }
            Some(Cmd::Run(opts))
        }
        "dis" => Some(Cmd::Dis {
            filepath: args.next()?,
        }),
        _ => None,
    }
}

/// Parse a numeric option value, falling back to the usage text on junk.
fn parse_num(arg: Option<String>) -> Option<u64> {
    arg?.parse().ok()
}

fn print_usage() {
    println!("ocho v{}", env!("CARGO_PKG_VERSION"));
    println!("{USAGE}");
}
