use crate::camera::Frame;
use crate::export::RowWriter;
use crate::Result;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Extension used for raw pixel dumps.
pub const RAW_FRAME_EXT: &str = "raw";

/// Give up after this many numbered names are taken.
const MAX_INSTANCES: u32 = 9999;

/// Directory that snapshot files are created in without overwriting.
///
/// The first file for `name` is `name.ext`; later ones are `name_002.ext`,
/// `name_003.ext` and so on.
#[derive(Debug, Clone)]
pub struct SnapshotDir {
    dir: PathBuf,
}

impl SnapshotDir {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Atomically create the first free file for `name`.
    pub fn create_unique(&self, name: &str, ext: &str) -> Result<(PathBuf, File)> {
        for instance in 1..=MAX_INSTANCES {
            let file_name = if instance == 1 {
                format!("{}.{}", name, ext)
            } else {
                format!("{}_{:03}.{}", name, instance, ext)
            };
            let path = self.dir.join(file_name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("no free snapshot name for {} in {}", name, self.dir.display()),
        )
        .into())
    }

    /// Dump a frame's raw pixels, named after its stream.
    pub fn save_frame(&self, frame: &Frame) -> Result<PathBuf> {
        frame.validate()?;
        let (path, mut file) = self.create_unique(frame.stream.snapshot_name(), RAW_FRAME_EXT)?;
        file.write_all(&frame.data)?;
        file.flush()?;
        log::info!("Saved {} frame to {}", frame.stream, path.display());
        Ok(path)
    }

    /// Open `name.csv` for appending sensor rows.
    ///
    /// A header row is written only if the file is new or empty.
    pub fn open_csv_log(&self, name: &str) -> Result<RowWriter<BufWriter<File>>> {
        let path = self.dir.join(format!("{}.csv", name));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_empty = file.metadata()?.len() == 0;
        let writer = RowWriter::from_env(BufWriter::new(file));
        log::debug!("Logging sensor rows to {}", path.display());
        Ok(if is_empty {
            writer
        } else {
            writer.without_header()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::StreamType;
    use crate::types::AllSensors;

    #[test]
    fn test_unique_names_do_not_collide() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = SnapshotDir::new(tmp.path()).unwrap();

        let (first, _) = dir.create_unique("colorImg", "png").unwrap();
        let (second, _) = dir.create_unique("colorImg", "png").unwrap();
        let (third, _) = dir.create_unique("colorImg", "png").unwrap();

        assert_eq!(first.file_name().unwrap(), "colorImg.png");
        assert_eq!(second.file_name().unwrap(), "colorImg_002.png");
        assert_eq!(third.file_name().unwrap(), "colorImg_003.png");
    }

    #[test]
    fn test_save_frame_writes_raw_pixels() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = SnapshotDir::new(tmp.path().join("snapshots")).unwrap();

        let frame = Frame::new(StreamType::Depth, vec![9; StreamType::Depth.frame_len()]);
        let path = dir.save_frame(&frame).unwrap();
        assert_eq!(path.file_name().unwrap(), "depthImg.raw");
        assert_eq!(std::fs::read(&path).unwrap(), frame.data);

        let bad = Frame::new(StreamType::Depth, vec![0; 3]);
        assert!(dir.save_frame(&bad).is_err());
    }

    #[test]
    fn test_csv_log_appends_without_second_header() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = SnapshotDir::new(tmp.path()).unwrap();

        for ts in [1, 2] {
            let mut log = dir.open_csv_log("sensors").unwrap();
            log.write(&AllSensors {
                timestamp_ms: ts,
                ..Default::default()
            })
            .unwrap();
            log.flush().unwrap();
        }

        let text = std::fs::read_to_string(tmp.path().join("sensors.csv")).unwrap();
        let headers = text.lines().filter(|l| l.starts_with("timeStamp")).count();
        assert_eq!(headers, 1);
        assert_eq!(text.lines().count(), 3);
    }
}
