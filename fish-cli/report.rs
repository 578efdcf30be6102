use fish_core::FishError;
use std::fmt;
use std::path::PathBuf;

/// A file whose conversion failed, with the reason
#[derive(Debug)]
pub struct FileFailure {
    pub file: PathBuf,
    pub error: FishError,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.error)
    }
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files whose two outputs were written
    pub converted: usize,
    pub failed: Vec<FileFailure>,
    /// Files never claimed because the batch was cancelled
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.converted + self.failed.len() + self.skipped.len()
    }

    /// True when every file was converted
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    pub fn was_cancelled(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.converted += other.converted;
        self.failed.extend(other.failed);
        self.skipped.extend(other.skipped);
    }

    pub fn summary(&self) -> String {
        let mut s = format!("converted {} of {} files", self.converted, self.total());
        if !self.failed.is_empty() {
            s.push_str(&format!(", {} failed", self.failed.len()));
        }
        if !self.skipped.is_empty() {
            s.push_str(&format!(", {} skipped (cancelled)", self.skipped.len()));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let r = BatchReport::default();
        assert!(r.is_success());
        assert_eq!(r.total(), 0);
        assert_eq!(r.summary(), "converted 0 of 0 files");
    }

    #[test]
    fn test_merge_and_summary() {
        let mut a = BatchReport { converted: 2, ..Default::default() };
        let b = BatchReport {
            converted: 1,
            failed: vec![FileFailure {
                file: PathBuf::from("bad.png"),
                error: FishError::Configuration("broken".into()),
            }],
            skipped: vec![PathBuf::from("late.png")],
        };
        a.merge(b);

        assert_eq!(a.total(), 5);
        assert!(!a.is_success());
        assert!(a.was_cancelled());
        assert_eq!(a.summary(), "converted 3 of 5 files, 1 failed, 1 skipped (cancelled)");
        assert!(a.failed[0].to_string().starts_with("bad.png: "));
    }
}
