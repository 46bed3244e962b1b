//! Workbook writer that owns worksheets and flushes them on close.

use std::collections::BTreeSet;
use std::path::PathBuf;

use rust_xlsxwriter::Workbook;

use crate::util::{create_sheet_identifier, sanitize_sheet_name};
use crate::worksheet::{Worksheet, derive_xlsx_error_text};

/// Stateful workbook writer.
///
/// Worksheets are buffered in memory until [`Self::close`] (or
/// [`Self::save_to_buffer`]) applies their column widths and serializes them.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    l_worksheets: Vec<Worksheet>,
    set_sheet_names_existing: BTreeSet<String>,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path.
    pub fn new(path_file_out: impl Into<PathBuf>) -> Self {
        Self {
            path_file_out: path_file_out.into(),
            workbook: Workbook::new(),
            l_worksheets: Vec::new(),
            set_sheet_names_existing: BTreeSet::new(),
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    pub fn if_closed(&self) -> bool {
        self.if_closed
    }

    /// Add a worksheet that retains cells; returns its index.
    ///
    /// `None` names the sheet `Sheet<n>`. Names are sanitized and suffixed
    /// (`name__2`) on collision.
    pub fn add_worksheet(&mut self, name: Option<&str>) -> Result<usize, String> {
        let c_sheet_name = self.derive_sheet_name(name)?;
        Ok(self.push_worksheet(Worksheet::new(&c_sheet_name)?))
    }

    /// Add a constant memory worksheet; autofit on it reports `-1`.
    pub fn add_worksheet_with_constant_memory(
        &mut self,
        name: Option<&str>,
    ) -> Result<usize, String> {
        let c_sheet_name = self.derive_sheet_name(name)?;
        Ok(self.push_worksheet(Worksheet::new_with_constant_memory(
            &c_sheet_name,
        )?))
    }

    pub fn worksheet(&self, idx: usize) -> Option<&Worksheet> {
        self.l_worksheets.get(idx)
    }

    pub fn worksheet_mut(&mut self, idx: usize) -> Option<&mut Worksheet> {
        self.l_worksheets.get_mut(idx)
    }

    pub fn worksheets(&self) -> &[Worksheet] {
        &self.l_worksheets
    }

    pub fn worksheets_mut(&mut self) -> &mut [Worksheet] {
        &mut self.l_worksheets
    }

    /// Flush workbook to disk. Idempotent; may be retried after a failed save.
    pub fn close(&mut self) -> Result<(), String> {
        if self.if_closed {
            return Ok(());
        }
        self.seal_worksheets()?;
        self.workbook
            .save(&self.path_file_out)
            .map_err(derive_xlsx_error_text)?;
        self.if_closed = true;
        log::debug!(
            "saved {} worksheet(s) to {}",
            self.l_worksheets.len(),
            self.file_out()
        );
        Ok(())
    }

    /// Serialize workbook into memory instead of the output path.
    ///
    /// Closes the writer; a later [`Self::close`] is a no-op.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, String> {
        if self.if_closed {
            return Err("Cannot save after close().".to_string());
        }
        self.seal_worksheets()?;
        let v_buffer = self
            .workbook
            .save_to_buffer()
            .map_err(derive_xlsx_error_text)?;
        self.if_closed = true;
        Ok(v_buffer)
    }

    /// Hand every unsealed sheet to the workbook; sheets sealed by a failed
    /// earlier save are already in it.
    fn seal_worksheets(&mut self) -> Result<(), String> {
        for worksheet in self
            .l_worksheets
            .iter_mut()
            .filter(|worksheet| !worksheet.if_sealed())
        {
            let worksheet_sealed = worksheet.seal()?;
            self.workbook.push_worksheet(worksheet_sealed);
        }
        Ok(())
    }

    fn push_worksheet(&mut self, worksheet: Worksheet) -> usize {
        self.l_worksheets.push(worksheet);
        self.l_worksheets.len() - 1
    }

    fn derive_sheet_name(&mut self, name: Option<&str>) -> Result<String, String> {
        if self.if_closed {
            return Err("Cannot add worksheet after close().".to_string());
        }
        let c_sheet_name = match name {
            Some(val) => sanitize_sheet_name(val, "_"),
            None => format!("Sheet{}", self.l_worksheets.len() + 1),
        };
        Ok(self.derive_unique_sheet_name(&c_sheet_name))
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        // Excel compares sheet names case-insensitively.
        let is_taken = |set_names: &BTreeSet<String>, candidate: &str| {
            set_names.contains(&candidate.to_lowercase())
        };

        if !is_taken(&self.set_sheet_names_existing, name) {
            self.set_sheet_names_existing.insert(name.to_lowercase());
            return name.to_string();
        }

        let mut n_idx = 2usize;
        loop {
            let candidate = create_sheet_identifier(name, n_idx);
            if !is_taken(&self.set_sheet_names_existing, &candidate) {
                self.set_sheet_names_existing.insert(candidate.to_lowercase());
                return candidate;
            }
            n_idx += 1;
        }
    }
}
