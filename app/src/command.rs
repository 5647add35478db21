use anyhow::{anyhow, bail};
use std::str::FromStr;

/// One line of the stdin protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Start,
    Stop,
    /// Pointer position in surface coordinates.
    Xy { x: f32, y: f32 },
    Range { low: i32, high: i32 },
    /// Drag the low end of the range bar.
    Low(i32),
    /// Drag the high end of the range bar.
    High(i32),
    Quit,
}

fn arg<T: FromStr>(args: &[&str], index: usize) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    let s = args
        .get(index)
        .ok_or_else(|| anyhow!("missing argument {}", index + 1))?;
    s.parse()
        .map_err(|e| anyhow!("bad argument {:?}: {}", s, e))
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words = s.split_whitespace().collect::<Vec<_>>();
        let Some((&name, args)) = words.split_first() else {
            bail!("empty command");
        };
        let (command, arity) = match name {
            "start" => (Self::Start, 0),
            "stop" => (Self::Stop, 0),
            "quit" => (Self::Quit, 0),
            "xy" => (
                Self::Xy {
                    x: arg(args, 0)?,
                    y: arg(args, 1)?,
                },
                2,
            ),
            "range" => (
                Self::Range {
                    low: arg(args, 0)?,
                    high: arg(args, 1)?,
                },
                2,
            ),
            "low" => (Self::Low(arg(args, 0)?), 1),
            "high" => (Self::High(arg(args, 0)?), 1),
            other => bail!("unknown command {:?}", other),
        };
        if args.len() > arity {
            bail!("too many arguments to {}", name);
        }
        Ok(command)
    }
}
