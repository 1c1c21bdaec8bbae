//! OSRM test backend: fetches a Geofabrik extract, preprocesses it with the
//! osrm-backend image (MLD pipeline) and serves it from a reusable container.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant, UNIX_EPOCH};

use testcontainers::core::{IntoContainerPort, Mount};
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, GenericImage, ImageExt, ReuseDirective, TestcontainersError};
use thiserror::Error;

const IMAGE: &str = "osrm/osrm-backend";
const REGION: &str = "north-america/us/nevada";

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("download: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    ProcessFailure(String),
}

/// Preprocessed OSRM files for one Geofabrik region.
pub struct Extract {
    pub dir: PathBuf,
    pub name: String,
}

impl Extract {
    fn osrm_file(&self) -> String {
        format!("{}-latest.osrm", self.name)
    }

    fn ready(&self) -> bool {
        ["osrm", "osrm.partition", "osrm.cells", "osrm.mldgr"]
            .iter()
            .all(|ext| self.dir.join(format!("{}-latest.{}", self.name, ext)).exists())
    }

    /// Seconds since epoch of the last preprocessing run, used to key the
    /// reusable container.
    fn stamp(&self) -> u64 {
        fs::metadata(self.dir.join(format!("{}.partition", self.osrm_file())))
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|age| age.as_secs())
            .unwrap_or(0)
    }
}

fn prepare(region: &str) -> Result<Extract, PrepError> {
    let root = std::env::var("OSRM_DATA_DIR").unwrap_or_else(|_| "osrm-data".to_string());
    let root = std::env::current_dir()?.join(root);
    let name = region.rsplit('/').next().unwrap_or("region").to_string();
    let dir = root.join(&name);
    fs::create_dir_all(&dir)?;

    let extract = Extract { dir, name };
    if extract.ready() {
        return Ok(extract);
    }

    let pbf = format!("{}-latest.osm.pbf", extract.name);
    let pbf_path = extract.dir.join(&pbf);
    if !pbf_path.exists() {
        download(
            &format!("https://download.geofabrik.de/{}-latest.osm.pbf", region),
            &pbf_path,
        )?;
    }

    let osrm = format!("/data/{}", extract.osrm_file());
    docker(&extract.dir, &["osrm-extract", "-p", "/opt/car.lua", &format!("/data/{}", pbf)])?;
    docker(&extract.dir, &["osrm-partition", &osrm])?;
    docker(&extract.dir, &["osrm-customize", &osrm])?;
    Ok(extract)
}

fn download(url: &str, dest: &Path) -> Result<(), PrepError> {
    let bytes = reqwest::blocking::get(url)?.error_for_status()?.bytes()?;
    let tmp = dest.with_extension("tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(tmp, dest)?;
    Ok(())
}

fn docker(data_dir: &Path, args: &[&str]) -> Result<(), PrepError> {
    let status = Command::new("docker")
        .args(["run", "--rm", "-t", "-v"])
        .arg(format!("{}:/data", data_dir.display()))
        .arg(IMAGE)
        .args(args)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(PrepError::ProcessFailure(format!("{} exited with {}", args[0], status)))
    }
}

/// Starts (or reuses) `osrm-routed` for Nevada. Returns the container and
/// its base URL.
pub fn osrm_container() -> Result<(Container<GenericImage>, String), TestcontainersError> {
    let extract = prepare(REGION).map_err(|err| TestcontainersError::other(format!("OSRM prep failed: {}", err)))?;

    let image = GenericImage::new(IMAGE, "latest")
        .with_exposed_port(5000.tcp())
        .with_mount(Mount::bind_mount(
            extract.dir.to_string_lossy().to_string(),
            "/data",
        ))
        .with_cmd(vec![
            "osrm-routed".to_string(),
            "--algorithm".to_string(),
            "mld".to_string(),
            format!("/data/{}", extract.osrm_file()),
        ])
        .with_container_name(format!("osrm-{}-{}", extract.name, extract.stamp()))
        .with_startup_timeout(Duration::from_secs(30))
        .with_reuse(ReuseDirective::Always);

    let container = image.start()?;
    let port = container.get_host_port_ipv4(5000.tcp())?;
    Ok((container, format!("http://127.0.0.1:{}", port)))
}

/// Retries `attempt` until it succeeds or `timeout` elapses; osrm-routed
/// accepts connections a moment after the container reports started.
pub fn eventually<T, E>(timeout: Duration, mut attempt: impl FnMut() -> Result<T, E>) -> Result<T, E> {
    let started = Instant::now();
    loop {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(err) if started.elapsed() >= timeout => return Err(err),
            Err(_) => std::thread::sleep(Duration::from_millis(500)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_failures_keep_their_kind() {
        let dest = std::env::temp_dir().join("route-sequencer-missing-dir").join("x.osm.pbf");

        // Nothing listens on the discard port.
        let refused = download("http://127.0.0.1:9/extract.osm.pbf", &dest);
        assert!(matches!(refused, Err(PrepError::Http(_))));

        let err = PrepError::from(io::Error::new(io::ErrorKind::NotFound, "no data dir"));
        assert!(matches!(err, PrepError::Io(_)));
        assert_eq!(err.to_string(), "io: no data dir");
    }
}
