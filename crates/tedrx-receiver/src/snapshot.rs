use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tedrx_frame::Packet;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;

/// Destination for the most recent reading (the dashboard boundary).
pub trait SnapshotPublisher {
    fn publish(&mut self, packet: &Packet) -> Result<()>;
}

impl<P: SnapshotPublisher + ?Sized> SnapshotPublisher for Box<P> {
    fn publish(&mut self, packet: &Packet) -> Result<()> {
        (**self).publish(packet)
    }
}

/// Render a packet as a `DashboardData` document, one element per field.
///
/// Mirrors the page served by the vendor's own software so existing
/// consumers (browser toolbars and the like) can read it unchanged.
pub fn render_dashboard_xml(packet: &Packet) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <DashboardData xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"\n\
         xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\">\n",
    );
    for (name, value) in packet.fields() {
        let _ = writeln!(xml, "<{name}>{value}</{name}>");
    }
    xml.push_str("</DashboardData>\n");
    xml
}

/// Publishes the `DashboardData` XML document to a file.
#[derive(Debug, Clone)]
pub struct DashboardXml {
    path: PathBuf,
}

impl DashboardXml {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotPublisher for DashboardXml {
    fn publish(&mut self, packet: &Packet) -> Result<()> {
        write_atomic(&self.path, render_dashboard_xml(packet).as_bytes())
    }
}

/// Publishes the reading as a flat JSON object to a file.
#[derive(Debug, Clone)]
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotPublisher for JsonSnapshot {
    fn publish(&mut self, packet: &Packet) -> Result<()> {
        let body = serde_json::to_vec_pretty(packet)?;
        write_atomic(&self.path, &body)
    }
}

// Readers never see a half-written file: write a temp file in the target's
// directory, then rename it into place.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.persist(path).map_err(|err| err.error)?;
    debug!(?path, bytes = contents.len(), "snapshot written");
    Ok(())
}
