use pc_core::error::CoreError;

/// Fournit les dimensions `(colonnes, lignes)` de la surface d'affichage.
///
/// Failure (no terminal attached, unsupported platform) is an explicit
/// error, never a silent default.
pub trait TerminalGeometry: Send + Sync {
    /// Current `(columns, rows)`.
    ///
    /// # Errors
    /// Returns [`CoreError::Terminal`] if the size can't be determined.
    fn size(&self) -> Result<(u32, u32), CoreError>;
}

/// Geometry of the controlling terminal, read through crossterm.
#[derive(Clone, Copy, Debug, Default)]
pub struct CrosstermTerminal;

impl TerminalGeometry for CrosstermTerminal {
    fn size(&self) -> Result<(u32, u32), CoreError> {
        let (cols, rows) =
            crossterm::terminal::size().map_err(|e| CoreError::Terminal(e.to_string()))?;
        if cols == 0 || rows == 0 {
            return Err(CoreError::Terminal(format!(
                "terminal reports {cols}×{rows}, is output redirected?"
            )));
        }
        log::debug!("terminal size: {cols}×{rows}");
        Ok((u32::from(cols), u32::from(rows)))
    }
}

/// Fixed geometry, for tests and headless callers.
///
/// # Example
/// ```
/// use pc_source::terminal::{FixedTerminal, TerminalGeometry};
/// let t = FixedTerminal { columns: 80, rows: 24 };
/// assert_eq!(t.size().unwrap(), (80, 24));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct FixedTerminal {
    /// Columns.
    pub columns: u32,
    /// Rows.
    pub rows: u32,
}

impl TerminalGeometry for FixedTerminal {
    fn size(&self) -> Result<(u32, u32), CoreError> {
        Ok((self.columns, self.rows))
    }
}

/// Geometry provider that always fails, as when no terminal is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTerminal;

impl TerminalGeometry for NoTerminal {
    fn size(&self) -> Result<(u32, u32), CoreError> {
        Err(CoreError::Terminal("no terminal attached".into()))
    }
}
