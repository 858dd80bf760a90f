//! Drive the Celestia planetarium as a batch star-field renderer.
//!
//! For each round a command script is written into the round's output
//! directory and Celestia is run on it:
//!
//! ```text
//! // Point and capture commands for Celestia
//! celestia point-to <longitude> <latitude> <distance>
//! celestia capture-starfield <output_dir>/round_<n>/<prefix>_<lon>_<lat>.png
//! wait <seconds>
//! ```
//!
//! The block repeats for every candidate in enumeration order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::RenderError;
use crate::grid::CandidateSet;
use crate::pose::SkyCoordinate;

use super::{capture_file_name, RenderedBatch, Renderer, RendererConfig};

/// Write the capture script for `candidates` into `out`, naming captures
/// inside `capture_dir`.
pub fn write_script<W: Write>(
    out: &mut W,
    candidates: &CandidateSet<SkyCoordinate>,
    capture_dir: &Path,
    config: &RendererConfig,
) -> std::io::Result<()> {
    for c in candidates {
        let path = capture_dir.join(capture_file_name(&config.file_prefix, c));
        writeln!(out, "// Point and capture commands for Celestia")?;
        writeln!(
            out,
            "celestia point-to {} {} {}",
            c.longitude_deg, c.latitude_deg, config.distance
        )?;
        writeln!(out, "celestia capture-starfield {}", path.display())?;
        writeln!(out, "wait {}", config.capture_wait_s)?;
    }
    Ok(())
}

/// Renderer backed by an external Celestia process.
#[derive(Debug, Clone, Default)]
pub struct CelestiaRenderer {
    pub config: RendererConfig,
}

impl CelestiaRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    fn wait_with_timeout(&self, child: &mut Child) -> Result<ExitStatus, RenderError> {
        let t0 = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(RenderError::Wait)? {
                return Ok(status);
            }
            if let Some(limit) = self.config.timeout {
                if t0.elapsed() >= limit {
                    // The process may exit between try_wait and kill.
                    if let Err(e) = child.kill() {
                        debug!("kill after timeout failed: {e}");
                    }
                    if let Err(e) = child.wait() {
                        debug!("reaping renderer after timeout failed: {e}");
                    }
                    return Err(RenderError::Timeout(limit));
                }
            }
            std::thread::sleep(self.config.poll_interval.min(Duration::from_secs(1)));
        }
    }
}

impl Renderer for CelestiaRenderer {
    fn render(
        &self,
        round: usize,
        candidates: &CandidateSet<SkyCoordinate>,
    ) -> Result<RenderedBatch, RenderError> {
        let round_dir = self.config.output_dir.join(format!("round_{round}"));
        std::fs::create_dir_all(&round_dir).map_err(|source| RenderError::OutputDirectory {
            path: round_dir.clone(),
            source,
        })?;

        let script_path = round_dir.join(&self.config.script_name);
        let script_err = |source| RenderError::Script {
            path: script_path.clone(),
            source,
        };
        let file = File::create(&script_path).map_err(script_err)?;
        let mut out = BufWriter::new(file);
        write_script(&mut out, candidates, &round_dir, &self.config).map_err(script_err)?;
        out.flush().map_err(script_err)?;
        debug!(
            "Wrote {} capture commands to {}",
            candidates.len(),
            script_path.display()
        );

        info!(
            "Running {} on {} ({} captures)",
            self.config.executable.display(),
            script_path.display(),
            candidates.len()
        );
        let t0 = Instant::now();
        let mut child = Command::new(&self.config.executable)
            .arg("--script")
            .arg(&script_path)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: self.config.executable.clone(),
                source,
            })?;
        let status = self.wait_with_timeout(&mut child)?;
        if !status.success() {
            warn!("Renderer exited with {status}; missing captures will be skipped");
        }
        info!("Renderer finished in {:.1} s", t0.elapsed().as_secs_f32());

        if !round_dir.is_dir() {
            return Err(RenderError::NoOutput { path: round_dir });
        }
        Ok(RenderedBatch::expected(
            &round_dir,
            &self.config.file_prefix,
            candidates,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CandidateGrid, SkyGrid};

    #[test]
    fn script_lists_every_candidate_in_order() {
        let set = SkyGrid.generate(&SkyCoordinate::new(0.0, 0.0), 10.0, 1);
        let mut buf = Vec::new();
        write_script(&mut buf, &set, Path::new("out"), &RendererConfig::default()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9 * 4);
        assert_eq!(lines[0], "// Point and capture commands for Celestia");
        assert_eq!(lines[1], "celestia point-to -10 -10 10000");
        assert_eq!(
            lines[2],
            format!("celestia capture-starfield {}", Path::new("out").join("starfield_-10_-10.png").display())
        );
        assert_eq!(lines[3], "wait 0.5");
        assert_eq!(lines[5], "celestia point-to -10 0 10000");
        assert_eq!(lines[33], "celestia point-to 10 10 10000");
    }

    #[test]
    fn missing_executable_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = CelestiaRenderer::new(RendererConfig {
            executable: dir.path().join("no-such-renderer"),
            output_dir: dir.path().join("renders"),
            ..Default::default()
        });
        let set = CandidateSet::from_vec(vec![SkyCoordinate::new(0.0, 0.0)]);
        let err = renderer.render(0, &set).unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
        // The script is still written before launch.
        assert!(dir.path().join("renders/round_0/celestia_script.txt").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn slow_renderer_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow.sh");
        std::fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let renderer = CelestiaRenderer::new(RendererConfig {
            executable: script,
            output_dir: dir.path().join("renders"),
            timeout: Some(Duration::from_millis(200)),
            poll_interval: Duration::from_millis(20),
            ..Default::default()
        });
        let set = CandidateSet::from_vec(vec![SkyCoordinate::new(0.0, 0.0)]);
        let err = renderer.render(1, &set).unwrap_err();
        assert!(matches!(err, RenderError::Timeout(_)));
    }

    #[cfg(unix)]
    #[test]
    fn finished_renderer_returns_expected_paths() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("noop.sh");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let renderer = CelestiaRenderer::new(RendererConfig {
            executable: script,
            output_dir: dir.path().join("renders"),
            poll_interval: Duration::from_millis(10),
            ..Default::default()
        });
        let set = CandidateSet::from_vec(vec![SkyCoordinate::new(5.0, -5.0)]);
        let batch = renderer.render(2, &set).unwrap();
        assert_eq!(
            batch.path_for(&SkyCoordinate::new(5.0, -5.0)),
            Some(dir.path().join("renders/round_2/starfield_5_-5.png").as_path())
        );
    }
}
