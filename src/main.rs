use std::io::{self, BufRead};
use std::path::Path;

use anyhow::Context;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use layermenu::parse::parse_line;
use layermenu::session::{format_selection, HoverFn};
use layermenu::{Config, FontShaper, MenuId, MenuTree, Outcome, Session};

fn parse_args(config: &mut Config) -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-i" => config.disable_icons = true,
            "-p" => {
                let value = args.next().context("-p requires a X,Y position")?;
                let (x, y) = value
                    .split_once(',')
                    .context("-p requires a X,Y position")?;
                config.spawn_x = x.trim().parse().context("invalid X position")?;
                config.spawn_y = y.trim().parse().context("invalid Y position")?;
            }
            _ => anyhow::bail!("usage: layermenu [-i] [-p X,Y]"),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut config = Config::default();
    parse_args(&mut config)?;

    let text = FontShaper::from_spec(&config.font)?;
    let mut tree: MenuTree<String> = MenuTree::new(&config);

    for line in io::stdin().lock().lines() {
        let line = line?;
        let Some(entry) = parse_line(&line)? else {
            continue;
        };
        let icon = entry.icon.as_deref().map(Path::new);
        tree.append(
            MenuId::ROOT,
            &entry.label,
            entry.output.clone(),
            icon,
            entry.depth,
            &config,
            &text,
        )
        .with_context(|| format!("bad menu line {:?}", line))?;
    }

    let hover: HoverFn<String> = Box::new(|output| debug!(%output, "hovering"));
    match Session::run(config, Box::new(text), tree, Some(hover))? {
        Outcome::Selected(output) => {
            print!("{}", format_selection(&output));
            Ok(())
        }
        Outcome::Cancelled | Outcome::Exited => std::process::exit(1),
    }
}
