use std::collections::BTreeMap;

use datpar_io_xlsx::{
    ConvertError, SpecConvertReport, SpecHeaderPlacement, convert_dat_par_to_xlsx,
    derive_default_convert_options, derive_windowed_convert_options,
};
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::PyBytes;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "datpar.xlsx.convert.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "SpecHeaderPlacement")]
#[derive(Debug, Clone)]
struct PySpecHeaderPlacement {
    #[pyo3(get)]
    col_start: usize,
    #[pyo3(get)]
    width: usize,
    #[pyo3(get)]
    label: String,
    #[pyo3(get)]
    if_cooling_expansion: bool,
}

impl From<SpecHeaderPlacement> for PySpecHeaderPlacement {
    fn from(placement: SpecHeaderPlacement) -> Self {
        Self {
            col_start: placement.col_start,
            width: placement.width,
            label: placement.label,
            if_cooling_expansion: placement.if_cooling_expansion,
        }
    }
}

#[pymethods]
impl PySpecHeaderPlacement {
    #[getter]
    fn col_end(&self) -> usize {
        self.col_start + self.width - 1
    }

    fn __repr__(&self) -> String {
        format!(
            "SpecHeaderPlacement(col_start={}, width={}, label={:?}, if_cooling_expansion={})",
            self.col_start, self.width, self.label, self.if_cooling_expansion
        )
    }
}

#[pyclass(name = "ReportConvert")]
#[derive(Debug, Clone)]
struct PyReportConvert {
    #[pyo3(get)]
    cnt_rows_par: usize,
    #[pyo3(get)]
    cnt_cols_par: usize,
    #[pyo3(get)]
    cnt_rows_dat: usize,
    #[pyo3(get)]
    cnt_cols_dat: usize,
    #[pyo3(get)]
    cnt_cols_header: usize,
    #[pyo3(get)]
    delimiter: Option<String>,
    #[pyo3(get)]
    placements: Vec<PySpecHeaderPlacement>,
    #[pyo3(get)]
    warnings: Vec<String>,
    inner: SpecConvertReport,
}

impl From<SpecConvertReport> for PyReportConvert {
    fn from(report: SpecConvertReport) -> Self {
        Self {
            cnt_rows_par: report.n_rows_par,
            cnt_cols_par: report.n_cols_par,
            cnt_rows_dat: report.n_rows_dat,
            cnt_cols_dat: report.n_cols_dat,
            cnt_cols_header: report.n_cols_header,
            delimiter: report.delimiter.map(|val| val.to_string()),
            placements: report
                .placements
                .iter()
                .cloned()
                .map(PySpecHeaderPlacement::from)
                .collect(),
            warnings: report.warnings.clone(),
            inner: report,
        }
    }
}

#[pymethods]
impl PyReportConvert {
    #[getter]
    fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.inner.to_dict()
    }

    #[pyo3(signature = (prefix = "[CONVERT]"))]
    fn format(&self, prefix: &str) -> String {
        self.inner.format(prefix)
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

fn map_convert_error(err: ConvertError) -> PyErr {
    PyRuntimeError::new_err(err.format_user_message())
}

#[pyfunction(name = "convert_dat_par")]
#[pyo3(signature = (dat_bytes, par_bytes, windowed = false))]
fn convert_dat_par_py<'py>(
    py: Python<'py>,
    dat_bytes: &[u8],
    par_bytes: &[u8],
    windowed: bool,
) -> PyResult<(Bound<'py, PyBytes>, PyReportConvert)> {
    let options = if windowed {
        derive_windowed_convert_options()
    } else {
        derive_default_convert_options()
    };

    let output = py.allow_threads(|| convert_dat_par_to_xlsx(dat_bytes, par_bytes, &options));
    let output = output.map_err(map_convert_error)?;
    Ok((
        PyBytes::new(py, &output.bytes),
        PyReportConvert::from(output.report),
    ))
}

#[pymodule]
fn _datpar_io_xlsx_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PySpecHeaderPlacement>()?;
    module.add_class::<PyReportConvert>()?;
    module.add_function(wrap_pyfunction!(convert_dat_par_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
