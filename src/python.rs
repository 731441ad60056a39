use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pythonize::{depythonize, pythonize};
use rshox_core::derived;
use rshox_core::{HOxError, SolverConfig, SteadyState, DEFAULT_NO2_TO_NO_RATIO};

fn to_py_err(error: HOxError) -> PyErr {
    PyValueError::new_err(error.to_string())
}

/// A missing config falls back to the defaults
fn extract_config(config: Option<&Bound<'_, PyAny>>) -> PyResult<SolverConfig> {
    let config = match config {
        Some(config) => depythonize::<SolverConfig>(config)
            .map_err(|e| PyValueError::new_err(format!("{}", e)))?,
        None => SolverConfig::default(),
    };
    config.validate().map_err(to_py_err)?;
    Ok(config)
}

fn extract_state(state: &Bound<'_, PyAny>) -> PyResult<SteadyState> {
    depythonize::<SteadyState>(state).map_err(|e| PyValueError::new_err(format!("{}", e)))
}

/// Solve for the steady-state OH, HO2 and RO2 concentrations
///
/// Returns the solved state as a dict, including the solver diagnostics.
#[pyfunction]
#[pyo3(signature = (no, no2, production_rate, reactivity, branching_ratio, config=None))]
fn solve<'py>(
    py: Python<'py>,
    no: f64,
    no2: f64,
    production_rate: f64,
    reactivity: f64,
    branching_ratio: f64,
    config: Option<&Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyAny>> {
    let config = extract_config(config)?;
    let state = rshox_core::solve(
        no,
        no2,
        production_rate,
        reactivity,
        branching_ratio,
        &config,
    )
    .map_err(to_py_err)?;
    Ok(pythonize(py, &state)?)
}

/// Solve from total NOx, split into NO and NO2 with a fixed ratio
///
/// `no2_to_no_ratio` and `config` are keyword-only; the ratio defaults to 4.
#[pyfunction]
#[pyo3(signature = (
    nox_total,
    production_rate,
    reactivity,
    branching_ratio,
    *,
    no2_to_no_ratio=DEFAULT_NO2_TO_NO_RATIO,
    config=None
))]
fn solve_nox<'py>(
    py: Python<'py>,
    nox_total: f64,
    production_rate: f64,
    reactivity: f64,
    branching_ratio: f64,
    no2_to_no_ratio: f64,
    config: Option<&Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyAny>> {
    let config = extract_config(config)?;
    let state = rshox_core::solve_nox(
        nox_total,
        no2_to_no_ratio,
        production_rate,
        reactivity,
        branching_ratio,
        &config,
    )
    .map_err(to_py_err)?;
    Ok(pythonize(py, &state)?)
}

/// NOx lifetimes (hours) of a solved state
#[pyfunction]
fn nox_lifetime<'py>(py: Python<'py>, state: &Bound<'py, PyAny>) -> PyResult<Bound<'py, PyAny>> {
    let lifetime = derived::nox_lifetime(&extract_state(state)?);
    Ok(pythonize(py, &lifetime)?)
}

#[pyfunction]
fn ozone_production(state: &Bound<'_, PyAny>) -> PyResult<f64> {
    Ok(derived::ozone_production(&extract_state(state)?))
}

#[pyfunction]
fn nox_loss(state: &Bound<'_, PyAny>) -> PyResult<f64> {
    Ok(derived::nox_loss(&extract_state(state)?))
}

#[pyfunction]
fn ozone_production_efficiency(state: &Bound<'_, PyAny>) -> PyResult<f64> {
    Ok(derived::ozone_production_efficiency(&extract_state(state)?))
}

#[pymodule]
#[pyo3(name = "_lib")]
fn rshox(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_function(wrap_pyfunction!(solve, m)?)?;
    m.add_function(wrap_pyfunction!(solve_nox, m)?)?;
    m.add_function(wrap_pyfunction!(nox_lifetime, m)?)?;
    m.add_function(wrap_pyfunction!(ozone_production, m)?)?;
    m.add_function(wrap_pyfunction!(nox_loss, m)?)?;
    m.add_function(wrap_pyfunction!(ozone_production_efficiency, m)?)?;
    Ok(())
}
