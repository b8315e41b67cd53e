//! Summary of an export run.

use std::fmt;

/// A problem with one object that did not stop the run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportWarning {
    /// Name of the object or surface.
    pub object: String,
    /// What went wrong.
    pub message: String,
}

impl ExportWarning {
    /// Create a warning and log it.
    pub(crate) fn new(object: &str, message: impl fmt::Display) -> Self {
        let warning = Self {
            object: object.to_string(),
            message: message.to_string(),
        };
        log::warn!("{}", warning);
        warning
    }
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.object, self.message)
    }
}

/// Counts and warnings collected while writing a map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    /// Objects processed.
    pub objects: usize,
    /// Brushes written.
    pub brushes: usize,
    /// Brush faces written.
    pub faces: usize,
    /// Brush faces whose texture solve was degenerate.
    pub degenerate_textures: usize,
    /// Patches written.
    pub patches: usize,
    /// Non-fatal problems, in the order they occurred.
    pub warnings: Vec<ExportWarning>,
}

impl ExportReport {
    /// Whether the run finished without warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} objects, {} brushes, {} faces, {} patches",
            self.objects, self.brushes, self.faces, self.patches
        )?;
        if self.degenerate_textures > 0 {
            write!(f, ", {} default texture bases", self.degenerate_textures)?;
        }
        if !self.warnings.is_empty() {
            write!(f, ", {} warnings", self.warnings.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut report = ExportReport {
            objects: 2,
            brushes: 5,
            faces: 25,
            ..Default::default()
        };
        assert!(report.is_clean());
        assert_eq!(report.to_string(), "2 objects, 5 brushes, 25 faces, 0 patches");
        report.warnings.push(ExportWarning::new("arch", "patch u axis is even"));
        assert_eq!(
            report.to_string(),
            "2 objects, 5 brushes, 25 faces, 0 patches, 1 warnings"
        );
        assert_eq!(report.warnings[0].to_string(), "arch: patch u axis is even");
    }
}
