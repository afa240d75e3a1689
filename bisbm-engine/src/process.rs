//! A concrete `PartitioningEngine` that spawns an external MCMC/KL
//! style binary over a CLI contract (example flags, not a mandatory
//! naming).

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use bisbm_types::{BisbmError, Result};
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::adapter::{EngineOutput, Method, PartitioningEngine};
use crate::cooling::CoolingSchedule;

/// Configuration bundle of engine options: annealing schedule, cooling
/// parameters, sweep count, `ε` proposal parameter, plus the binary
/// path and idle timeout.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[clap(next_help_heading = "Engine")]
pub struct EngineOptions {
    /// Path to the external partitioning engine binary.
    #[clap(long)]
    pub engine_bin: PathBuf,

    /// Number of independent sweeps run per candidate `(K_a, K_b)`;
    /// the driver keeps the sweep with the lowest DL.
    #[clap(long, default_value_t = 4)]
    pub n_sweeps: usize,

    /// Total MCMC steps (`-t`).
    #[clap(long, default_value_t = 1_000_000)]
    pub steps: u64,

    /// Steps to await before declaring convergence (`-x`).
    #[clap(long, default_value_t = 100_000)]
    pub await_steps: u64,

    /// Proposal parameter `ε` (`-E`).
    #[clap(long, default_value_t = 0.001)]
    pub epsilon: f64,

    /// Idle timeout per invocation, default 600s.
    #[clap(long, default_value_t = 600)]
    pub idle_timeout_secs: u64,
}

impl EngineOptions {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Splits `total` nodes into `n` nearly-equal contiguous block sizes,
/// used to seed the engine's block-size vector (`-n`).
fn equal_block_sizes(n: usize, total: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let base = total / n;
    let remainder = total % n;
    (0..n)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

pub struct ProcessEngine {
    options: EngineOptions,
    cooling: CoolingSchedule,
}

impl ProcessEngine {
    pub fn new(options: EngineOptions, cooling: CoolingSchedule) -> Self {
        Self { options, cooling }
    }

    /// Runs `cmd` to completion, killing and reporting `EngineFailure`
    /// if it runs past `self.options.idle_timeout()`: every pool call
    /// carries an idle timeout and workers that exceed it get
    /// harvested. Polls via `try_wait` rather than blocking on
    /// `Child::wait` so the timeout can actually fire.
    fn run_with_timeout(
        &self,
        mut cmd: Command,
        k_a: u32,
        k_b: u32,
        command_line: &str,
    ) -> Result<std::process::Output> {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let mut child = cmd.spawn().map_err(|e| BisbmError::EngineFailure {
            k_a,
            k_b,
            command: command_line.to_string(),
            reason: format!("failed to spawn engine process: {e}"),
        })?;

        let timeout = self.options.idle_timeout();
        let poll_interval = Duration::from_millis(50);
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) => {
                    if started.elapsed() >= timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        warn!("engine timed out after {timeout:?} at (K_a={k_a}, K_b={k_b}), killed");
                        return Err(BisbmError::EngineFailure {
                            k_a,
                            k_b,
                            command: command_line.to_string(),
                            reason: format!("idle timeout of {timeout:?} exceeded"),
                        });
                    }
                    std::thread::sleep(poll_interval);
                }
                Err(e) => {
                    return Err(BisbmError::EngineFailure {
                        k_a,
                        k_b,
                        command: command_line.to_string(),
                        reason: format!("failed to poll engine process: {e}"),
                    })
                }
            }
        }
        child.wait_with_output().map_err(|e| BisbmError::EngineFailure {
            k_a,
            k_b,
            command: command_line.to_string(),
            reason: format!("failed to collect engine output: {e}"),
        })
    }

    fn build_command(
        &self,
        edges_path: &Path,
        n_a: usize,
        n_b: usize,
        k_a: u32,
        k_b: u32,
        mb: Option<&[u32]>,
        method: Method,
    ) -> Command {
        let n_blocks_a = equal_block_sizes(k_a as usize, n_a);
        let n_blocks_b = equal_block_sizes(k_b as usize, n_b);
        let n_blocks: Vec<String> = n_blocks_a
            .iter()
            .chain(n_blocks_b.iter())
            .map(|n| n.to_string())
            .collect();

        let mut cmd = Command::new(&self.options.engine_bin);
        cmd.arg("-e")
            .arg(edges_path)
            .arg("-n")
            .arg(n_blocks.join(" "))
            .arg("-t")
            .arg(self.options.steps.to_string())
            .arg("-x")
            .arg(self.options.await_steps.to_string())
            .arg("-c")
            .arg(self.cooling.kind.as_flag())
            .arg("-a")
            .arg(self.cooling.params_arg())
            .arg("-y")
            .arg(format!("{n_a} {n_b}"))
            .arg("-z")
            .arg(format!("{k_a} {k_b}"));
        cmd.arg("-E").arg(self.options.epsilon.to_string());

        match (method, mb) {
            (Method::Natural, _) => {
                cmd.arg("-g").arg("-u");
            }
            (Method::Standard, None) => {
                cmd.arg("-g");
            }
            (Method::Standard, Some(warm_start)) => {
                cmd.arg("--mb");
                for &label in warm_start {
                    cmd.arg(label.to_string());
                }
            }
        }
        cmd
    }
}

impl PartitioningEngine for ProcessEngine {
    fn run(
        &self,
        edges_path: &Path,
        n_a: usize,
        n_b: usize,
        k_a: u32,
        k_b: u32,
        mb: Option<&[u32]>,
        method: Method,
    ) -> Result<EngineOutput> {
        let mut cmd = self.build_command(edges_path, n_a, n_b, k_a, k_b, mb, method);
        let command_line = format!("{:?}", cmd);

        info!("dispatching engine at (K_a={k_a}, K_b={k_b}): {command_line}");
        let output = self.run_with_timeout(cmd, k_a, k_b, &command_line)?;

        if !output.status.success() {
            warn!("engine exited non-zero at (K_a={k_a}, K_b={k_b})");
            return Err(BisbmError::EngineFailure {
                k_a,
                k_b,
                command: command_line,
                reason: format!("exit status: {}", output.status),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut tokens = stdout.split_whitespace();
        let expected_len = n_a + n_b;

        let (k_a_out, k_b_out) = if method == Method::Natural {
            let parse_dim = |t: Option<&str>| -> Result<u32> {
                t.and_then(|s| s.parse().ok())
                    .ok_or_else(|| BisbmError::EngineFailure {
                        k_a,
                        k_b,
                        command: command_line.clone(),
                        reason: "natural-merge output missing leading K_a/K_b tokens".into(),
                    })
            };
            (Some(parse_dim(tokens.next())?), Some(parse_dim(tokens.next())?))
        } else {
            (None, None)
        };

        let partition: std::result::Result<Vec<u32>, _> = tokens.map(|t| t.parse::<u32>()).collect();
        let partition = partition.map_err(|e| BisbmError::EngineFailure {
            k_a,
            k_b,
            command: command_line.clone(),
            reason: format!("could not parse partition vector: {e}"),
        })?;

        if partition.len() != expected_len {
            return Err(BisbmError::EngineFailure {
                k_a,
                k_b,
                command: command_line,
                reason: format!(
                    "partition has {} entries, expected {expected_len}",
                    partition.len()
                ),
            });
        }

        Ok(EngineOutput {
            partition,
            k_a: k_a_out,
            k_b: k_b_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cooling::CoolingKind;

    #[test]
    fn equal_block_sizes_sums_to_total() {
        let sizes = equal_block_sizes(3, 10);
        assert_eq!(sizes.iter().sum::<usize>(), 10);
        assert_eq!(sizes.len(), 3);
    }

    #[test]
    fn equal_block_sizes_handles_zero_blocks() {
        assert_eq!(equal_block_sizes(0, 10), Vec::<usize>::new());
    }

    fn dummy_engine(idle_timeout_secs: u64) -> ProcessEngine {
        ProcessEngine::new(
            EngineOptions {
                engine_bin: "true".into(),
                n_sweeps: 1,
                steps: 0,
                await_steps: 0,
                epsilon: 0.001,
                idle_timeout_secs,
            },
            CoolingSchedule::new(CoolingKind::Constant, 1.0, None).unwrap(),
        )
    }

    #[test]
    fn run_with_timeout_kills_a_process_that_outlives_the_deadline() {
        let engine = dummy_engine(0);
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let err = engine
            .run_with_timeout(cmd, 1, 1, "sleep 5")
            .expect_err("process sleeping past a 0s timeout must be killed");
        match err {
            BisbmError::EngineFailure { reason, .. } => {
                assert!(reason.contains("idle timeout"), "unexpected reason: {reason}");
            }
            other => panic!("expected EngineFailure, got {other:?}"),
        }
    }

    #[test]
    fn run_with_timeout_succeeds_for_a_fast_process() {
        let engine = dummy_engine(600);
        let cmd = Command::new("true");
        let output = engine.run_with_timeout(cmd, 1, 1, "true").unwrap();
        assert!(output.status.success());
    }
}
