//! Stoichiometric matrix of a model and its export as flat text files
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use nalgebra::DMatrix;

use crate::metabolic_model::model::Model;

impl Model {
    /// Dense stoichiometric matrix, one row per metabolite and one column per reaction
    ///
    /// Rows and columns follow the order of `metabolites` and `reactions`.
    pub fn stoichiometric_matrix(&self) -> DMatrix<f64> {
        let mut matrix = DMatrix::zeros(self.metabolites.len(), self.reactions.len());
        for (col, reaction) in self.reactions.values().enumerate() {
            for (met, coef) in &reaction.metabolites {
                if let Some(row) = self.metabolites.get_index_of(met) {
                    matrix[(row, col)] += coef;
                }
            }
        }
        matrix
    }

    /// Write the stoichiometric description of the model as flat files next to `stem`
    ///
    /// - `{stem}.sfile`: the stoichiometric matrix, tab separated
    /// - `{stem}.mfile`: metabolite ids
    /// - `{stem}.rfile`: reaction ids
    /// - `{stem}.rvfile`: `1` for reversible reactions, `0` otherwise
    ///
    /// # Returns
    /// The paths of the written files, in the order above
    pub fn write_flat_files<P: AsRef<Path>>(&self, stem: P) -> std::io::Result<[PathBuf; 4]> {
        let stem = stem.as_ref();
        // appended rather than replaced, stems may contain dots
        let paths = ["sfile", "mfile", "rfile", "rvfile"].map(|ext| {
            let mut path = stem.as_os_str().to_owned();
            path.push(".");
            path.push(ext);
            PathBuf::from(path)
        });

        let matrix = self.stoichiometric_matrix();
        let mut sfile = BufWriter::new(File::create(&paths[0])?);
        for row in matrix.row_iter() {
            let line: Vec<String> = row.iter().map(|v| format_general(*v)).collect();
            writeln!(sfile, "{}", line.join("\t"))?;
        }
        sfile.flush()?;

        let metabolites: Vec<&str> = self.metabolites.keys().map(String::as_str).collect();
        write_line(&paths[1], &metabolites)?;
        let reactions: Vec<&str> = self.reactions.keys().map(String::as_str).collect();
        write_line(&paths[2], &reactions)?;
        let reversibility: Vec<&str> = self
            .reactions
            .values()
            .map(|r| if r.reversibility() { "1" } else { "0" })
            .collect();
        write_line(&paths[3], &reversibility)?;

        info!(
            "Wrote {} x {} stoichiometric matrix to {}",
            matrix.nrows(),
            matrix.ncols(),
            paths[0].display()
        );
        Ok(paths)
    }
}

fn write_line(path: &Path, items: &[&str]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{}", items.join(" "))?;
    writer.flush()
}

/// Format a number like printf's `%g`: six significant digits, trailing zeros removed,
/// scientific notation for exponents below -4 or from 6 on
pub fn format_general(value: f64) -> String {
    if value == 0. {
        return "0".to_string();
    }
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0. {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    // rounding to six significant digits can carry into the exponent, so take it from here
    let scientific = format!("{:.5e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (5 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
