use std::fs::{create_dir_all, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::WriterBuilder;

use crate::routines::settings::Settings;
use crate::routines::summary::Summary;
use crate::simulator::Trajectory;

/// Result of a simulation run, ready to be summarized or written to disk
#[derive(Debug, Clone)]
pub struct SimulationResult {
    trajectory: Trajectory,
    summary: Summary,
    settings: Settings,
}

impl SimulationResult {
    pub fn new(trajectory: Trajectory, summary: Summary, settings: Settings) -> Self {
        Self {
            trajectory,
            summary,
            settings,
        }
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Writes the trajectory, the summary and the settings to the output folder
    pub fn write_outputs(&self) -> Result<()> {
        if !self.settings.output.write {
            return Ok(());
        }
        tracing::debug!("Writing outputs to {:?}", self.settings.output.path);
        self.settings.write()?;
        self.write_trajectory()?;
        self.write_summary()?;
        Ok(())
    }

    /// Writes `trajectory.csv`, one row per output time
    pub fn write_trajectory(&self) -> Result<()> {
        let outputfile = OutputFile::new(&self.settings.output.path, "trajectory.csv")?;
        write_trajectory(&self.trajectory, outputfile.file())?;
        tracing::debug!("Trajectory written to {:?}", outputfile.relative_path());
        Ok(())
    }

    /// Writes `summary.csv`, one row per summarized compartment
    pub fn write_summary(&self) -> Result<()> {
        let outputfile = OutputFile::new(&self.settings.output.path, "summary.csv")?;
        write_summary(&self.summary, outputfile.file())?;
        tracing::debug!("Summary written to {:?}", outputfile.relative_path());
        Ok(())
    }
}

/// Writes a trajectory as CSV with a `time,WS,...,D` header
pub fn write_trajectory<W: std::io::Write>(trajectory: &Trajectory, writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in trajectory.rows() {
        writer.serialize(row)?;
    }
    writer.flush().context("Failed to flush trajectory")?;
    Ok(())
}

/// Writes a summary as CSV with a `column,min,q1,median,mean,q3,max` header
pub fn write_summary<W: std::io::Write>(summary: &Summary, writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in summary.rows() {
        writer.serialize(row)?;
    }
    writer.flush().context("Failed to flush summary")?;
    Ok(())
}

/// Contains all the necessary information of an output file
#[derive(Debug)]
pub struct OutputFile {
    file: File,
    relative_path: PathBuf,
}

impl OutputFile {
    pub fn new(folder: &str, file_name: &str) -> Result<Self> {
        let relative_path = Path::new(&folder).join(file_name);

        if let Some(parent) = relative_path.parent() {
            create_dir_all(parent)
                .with_context(|| format!("Failed to create directories for {:?}", parent))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&relative_path)
            .with_context(|| format!("Failed to open file: {:?}", relative_path))?;

        Ok(OutputFile {
            file,
            relative_path,
        })
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn file_owned(self) -> File {
        self.file
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Compartment, Compartments, Parameters};
    use crate::routines::summary::summarize;
    use crate::simulator::{simulate, Method};

    fn trajectory() -> Trajectory {
        simulate(
            &Compartments::default(),
            &Parameters::default(),
            &[0.0, 1.0, 2.0],
            Method::default(),
        )
        .unwrap()
    }

    #[test]
    fn trajectory_csv_layout() {
        let mut buffer = Vec::new();
        write_trajectory(&trajectory(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "time,WS,WNI,WI,NP,P,NPWI,PWI,CNIP,CIP,VS,D");
        assert!(lines[1].starts_with("0.0,10000.0,9000.0,"));
    }

    #[test]
    fn summary_csv_layout() {
        let summary = summarize(&trajectory(), &[Compartment::VS, Compartment::D]).unwrap();
        let mut buffer = Vec::new();
        write_summary(&summary, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "column,min,q1,median,mean,q3,max");
        assert!(lines[1].starts_with("VS,"));
        assert!(lines[2].starts_with("D,"));
    }

    #[test]
    fn output_file_creates_folders() {
        let folder = std::env::temp_dir().join("mtctsim_output_file_test/nested");
        let folder = folder.to_string_lossy().to_string();
        let outputfile = OutputFile::new(&folder, "test.csv").unwrap();
        assert!(outputfile.relative_path().exists());
    }
}
