use anyhow::{Result, anyhow};
use log::info;
use pico_args::Arguments;
use std::{env, path::PathBuf};

use crate::config::ConfigState;
use crate::devices;
use crate::display::{JsonLinesSink, LogSink, TerminalSink, printable};
use crate::fingers::{FingerStates, encode};
use crate::pipeline::{Pipeline, PipelineSettings, shutdown};
use crate::replay::Recording;

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("run") => {
            let opts = RunOptions {
                replay: pargs.opt_value_from_str("--replay")?,
                profile: pargs.opt_value_from_str("--profile")?,
                json: pargs.contains("--json"),
                quiet: pargs.contains("--quiet"),
            };
            run_session(opts)
        }

        Some("encode") => {
            let bits: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: fingerspell encode <8 binary digits>"))?;
            let states = FingerStates::parse(&bits)?;
            let ch = encode(&states);
            println!(
                "{bits} -> {} (U+{:04X}) '{}'",
                states.bits(),
                ch as u32,
                printable([ch])
            );
            Ok(())
        }

        Some("profiles") => {
            let cfg = ConfigState::load_or_install_default()?;
            for name in cfg.list_profiles() {
                let mark = if name == cfg.active_name { "*" } else { " " };
                println!("{mark} {name}");
            }
            Ok(())
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: fingerspell use <profile_name>"))?;
            let mut cfg = ConfigState::load_or_install_default()?;
            cfg.set_active(&name)?;
            println!("ok: active profile is now {}", cfg.active_name);
            Ok(())
        }

        Some("doctor") => {
            let cfg = ConfigState::load_or_install_default()?;
            let report = devices::doctor_report(&cfg);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

struct RunOptions {
    replay: Option<PathBuf>,
    profile: Option<String>,
    json: bool,
    quiet: bool,
}

fn run_session(opts: RunOptions) -> Result<()> {
    let cfg = ConfigState::load_or_install_default()?;
    let profile = match &opts.profile {
        Some(name) => cfg.profile_named(name)?,
        None => cfg.profile.clone(),
    };
    info!(
        "profile '{}': tick {}ms, run length {}, bend < {}°",
        opts.profile.as_deref().unwrap_or(&cfg.active_name),
        profile.thresholds.tick_ms,
        profile.thresholds.run_length,
        profile.thresholds.bend_angle_deg
    );

    let path = opts.replay.ok_or_else(|| {
        anyhow!("no live camera backend is built in; use --replay <recording.jsonl>")
    })?;
    let (camera, model) = Recording::load(&path)?.into_parts(profile.model_options());

    let pipeline = Pipeline::new(PipelineSettings::from_profile(&profile));
    let signals = shutdown::watch_signals(pipeline.stop_flag())?;

    let report = if opts.json {
        pipeline.run(camera, model, JsonLinesSink::new(std::io::stdout()))
    } else if opts.quiet {
        pipeline.run(camera, model, LogSink)
    } else {
        pipeline.run(camera, model, TerminalSink::stdout())
    };
    signals.close();
    let report = report?;

    info!(
        "spelled {:?} from {} frames ({} sampled)",
        report.sentence, report.frames, report.samples
    );
    if !opts.json {
        println!("{}", printable(report.sentence.chars()));
    }
    Ok(())
}

fn print_help() {
    println!(
        r#"fingerspell — spell sentences with two-hand finger codes

USAGE:
  fingerspell help [command]              Show general or command-specific help
  fingerspell run --replay <file>         Spell from a recorded detection stream
        [--profile <name>] [--json] [--quiet]
  fingerspell encode <bits>               Show the character for 8 finger bits
  fingerspell profiles                    List profiles
  fingerspell use <name>                  Switch active profile
  fingerspell doctor                      List cameras and check permissions

TIPS:
  - Profiles: ~/.config/fingerspell/profiles
  - Active profile pointer: ~/.config/fingerspell/active
  - RUST_LOG=debug shows every tick
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "run" => println!(
            "usage: fingerspell run --replay <file> [--profile <name>] [--json] [--quiet]\n\
             Replays recorded hand detections through the speller until the\n\
             recording ends or Ctrl-C. --json prints one update per tick as JSON,\n\
             --quiet only logs committed characters."
        ),
        "encode" => println!(
            "usage: fingerspell encode <bits>\n\
             Bits are 8 digits, left pinky first: e.g. 10000000 -> U+0001."
        ),
        "profiles" => {
            println!("usage: fingerspell profiles\nLists available profiles; marks active with '*'.")
        }
        "use" => println!("usage: fingerspell use <name>\nSwitches the active profile to <name>."),
        "doctor" => println!(
            "usage: fingerspell doctor\nLists camera devices and checks video group membership."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}
