//! Interactive console for driving the engine by hand.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use maxim::board::Board;
use maxim::engine::Engine;
use maxim::logger::init_logging;
use maxim::moves::perft::perft;
use maxim::rules::RuleSetConfig;
use std::str::FromStr;

fn main() {
    init_logging("logs/maxim.log", "info");

    let mut engine = Engine::new();
    let stdin = io::stdin();
    let mut out = io::stdout();

    println!("maxim console; 'help' lists commands");

    loop {
        print!("> ");
        let _ = out.flush();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim();
        let (cmd, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match cmd {
            "" => {}
            "help" => {
                println!("  fen <fen>           set position");
                println!("  startpos            reset to the initial position");
                println!("  d                   print the current FEN");
                println!("  moves               list legal moves");
                println!("  move <uci>          play a move");
                println!("  go [depth] [ms]     search (defaults: engine budget)");
                println!("  eval                static evaluation");
                println!("  evaluator <name>    material | classical-parametric | turing-like | rule");
                println!("  rules <file.json>   install a rule-evaluator configuration");
                println!("  perft <depth>       node count from the current position");
                println!("  status              game status");
                println!("  newgame             reset everything");
                println!("  quit");
            }
            "fen" => match engine.set_fen(rest) {
                Ok(()) => println!("ok"),
                Err(e) => println!("error: {}", e),
            },
            "startpos" => {
                engine.set_start_pos();
                println!("ok");
            }
            "d" => println!("{}", engine.get_fen()),
            "moves" => println!("{}", engine.get_moves().join(" ")),
            "move" => {
                if engine.make_move(rest) {
                    println!("ok");
                } else {
                    println!("illegal move: {}", rest);
                }
            }
            "go" => {
                let mut parts = rest.split_whitespace();
                let depth = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                let time_ms = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                let best = engine.search_move(depth, time_ms);
                let info = engine.get_info();
                println!(
                    "bestmove {} (depth {} seldepth {} score {} nodes {} time {}ms)",
                    best, info.depth, info.sel_depth, info.score, info.nodes, info.time_ms
                );
            }
            "eval" => println!("{} cp", engine.evaluate()),
            "evaluator" => match engine.set_evaluator(rest) {
                Ok(()) => println!("ok"),
                Err(e) => println!("error: {}", e),
            },
            "rules" => match std::fs::read_to_string(rest) {
                Ok(json) => match RuleSetConfig::from_json(&json)
                    .and_then(|config| engine.configure_rule_evaluator(&config).map(|()| config))
                {
                    Ok(config) => println!("installed rule set '{}'", config.name),
                    Err(e) => println!("error: {}", e),
                },
                Err(e) => println!("cannot read {}: {}", rest, e),
            },
            "perft" => {
                let depth: u32 = rest.parse().unwrap_or(1);
                let mut board = Board::from_str(&engine.get_fen()).expect("engine FEN is valid");
                let start = Instant::now();
                let nodes = perft(&mut board, depth);
                let secs = start.elapsed().as_secs_f64().max(1e-9);
                println!(
                    "perft({}) = {} ({:.3}s, {:.0} nps)",
                    depth,
                    nodes,
                    secs,
                    nodes as f64 / secs
                );
            }
            "status" => println!("{:?}", engine.detailed_status()),
            "newgame" => {
                engine.new_game();
                println!("ok");
            }
            "quit" | "exit" => break,
            other => println!("unknown command '{}'; try 'help'", other),
        }
    }
}
