//! Solver input template and slot filling.
//!
//! Placeholders are written `{{name}}`. The built-in template is the 2D box
//! model with a moving oceanic plate and a continental block at the right
//! end of the domain; every value that differs between runs or that lives in
//! `[model]` is a placeholder.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;

use super::naming::format_value;
use super::parameters::ParameterSet;
use super::{SweepError, SweepRun};
use crate::config::ModelConstants;
use crate::thermal::GradientCoefficients;

/// Placeholder syntax: `{{ name }}`, whitespace optional.
const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}";

/// Every placeholder a [`TemplateContext`] provides.
pub const PLACEHOLDERS: &[&str] = &[
    "run_index",
    "output_directory",
    "x_extent",
    "y_extent",
    "oceanic_x_extent",
    "convection_speed",
    "start_temperature",
    "continent_thickness",
    "continent_heating",
    "continent_density",
    "mantle_density",
    "mantle_heating",
    "surface_temperature",
    "cmb_temperature",
    "boundary_layer_fraction",
    "heat_a",
    "heat_b",
    "heat_c",
    "heat_d",
    "perturbation_amplitude",
    "perturbation_wavelength",
    "perturbation_mode",
    "end_time",
    "global_refinement",
    "x_repetitions",
    "output_interval",
];

const BUILTIN_TEMPLATE: &str = r"# Input file for ASPECT
# Sweep run {{run_index}}

# Dimensional 2D convection in a box with a prescribed moving plate on the
# oceanic part of the top boundary and a continental block on the right.

# Parameters varied across the sweep:
# Box x extent                                  (m)
# Convection speed and direction                (m/year)
# Mantle starting temperature                   (C)
# Continental crust internal radiogenic heating (W/m^3)
# Continental crust thickness                   (m)

# Set global parameters
set Dimension                              = 2
set Start time                             = 0
set End time                               = {{end_time}}
set Use years in output instead of seconds = true
set Nonlinear solver scheme                = iterated Stokes
set Nonlinear solver tolerance             = 1e-4
set Max nonlinear iterations               = 1
set CFL number                             = 0.5
set Output directory                       = {{output_directory}}
set Timing output frequency                = 20
set Pressure normalization                 = no

# Stokes solver parameters
subsection Solver parameters
  subsection Stokes solver parameters
    set Linear solver tolerance = 1e-7
    set Number of cheap Stokes solver steps = 0
  end
end

# Model domain
subsection Geometry model
  set Model name = box
  subsection Box
    set X repetitions = {{x_repetitions}}
    set Y repetitions = 1
    set X extent      = {{x_extent}}
    set Y extent      = {{y_extent}}
    set X periodic    = false
  end
end

# Finite element mesh
subsection Mesh refinement
  set Initial adaptive refinement        = 0
  set Initial global refinement          = {{global_refinement}}
  set Time steps between mesh refinement = 0
end

# Composition for the continental lithosphere
subsection Compositional fields
  set Number of fields = 1
  set Names of fields  = continent
end

subsection Initial composition model
  set Model name = function
  subsection Function
    set Function constants  = h={{y_extent}}
    set Variable names      = x,y
    set Function expression = if(x>{{oceanic_x_extent}} && y>(h-{{continent_thickness}}), 1, 0)
  end
end

# Boundary conditions for the heat equation
subsection Boundary temperature model
  set List of model names = box
  subsection Box
    set Bottom temperature = {{cmb_temperature}}
    set Top temperature    = {{surface_temperature}}
  end
  set Fixed temperature boundary indicators = bottom, top
end

# Boundary conditions for the Stokes equation
subsection Boundary velocity model
  set Tangential velocity boundary indicators = left, right, bottom
  set Prescribed velocity boundary indicators = top: function
  subsection Function
    set Variable names      = x,z,t
    set Function expression = if(x<{{oceanic_x_extent}}, {{convection_speed}}, 0); 0
  end
end

# Initial temperature field
subsection Initial temperature model
  set Model name = function
  subsection Function
    set Variable names      = x,z
    set Function constants  = p={{perturbation_amplitude}}, L={{perturbation_wavelength}}, pi=3.1415926536, k={{perturbation_mode}}, T0={{surface_temperature}}, h={{y_extent}}, f={{boundary_layer_fraction}}, A={{heat_a}}, B={{heat_b}}, C={{heat_c}}, D={{heat_d}}
    set Function expression = if(z<f*h, T0 + A*z+B - p*cos(k*pi*x/L)*sin(pi*z/h),\
                              if(z>(1-f)*h, T0 + C*z+D - p*cos(k*pi*x/L)*sin(pi*z/h),\
                              T0 + {{start_temperature}} - p*cos(k*pi*x/L)*sin(pi*z/h)))
  end
end

# Constant internal heat production values (W/m^3)
subsection Heating model
  set List of model names = compositional heating
  subsection Compositional heating
    set Compositional heating values = {{mantle_heating}}, {{continent_heating}}
  end
end

# Material in the box
subsection Material model
  set Model name = visco plastic

  subsection Visco Plastic
    set Viscous flow law = diffusion

    set Reference temperature = 293
    set Reference strain rate = 1.e-16

    set Minimum viscosity = 1e18
    set Maximum viscosity = 1e24

    set Thermal diffusivities = 1e-6
    set Heat capacities       = 1000.
    set Densities             = {{mantle_density}}, {{continent_density}}
    set Thermal expansivities = 3e-5

    set Viscosity averaging scheme = harmonic

    set Prefactors for diffusion creep           = 5e-23, 5e-25
    set Activation energies for diffusion creep  = 0.
    set Activation volumes for diffusion creep   = 0.
    set Grain size                               = 1.
    set Grain size exponents for diffusion creep = 0.

    set Angles of internal friction = 0
    set Cohesions                   = 1e20
    set Maximum yield stress        = 1e20
  end
end

# Gravity field
subsection Gravity model
  set Model name = vertical
  subsection Vertical
    set Magnitude = 9.81
  end
end

subsection Formulation
  set Formulation = Boussinesq approximation
end

# Output
subsection Postprocess
  set List of postprocessors = velocity statistics, basic statistics, temperature statistics, visualization, heat flux statistics, depth average
  subsection Visualization
    set List of output variables      = density, viscosity, strain rate, error indicator, melt fraction
    set Output format                 = vtu
    set Time between graphical output = {{output_interval}}
    set Interpolate output            = true
    set Number of grouped files       = 1
    subsection Melt fraction
      set A1 = 1085.7
      set A2 = 1.174e-7
    end
  end
end
";

// ============================================================================
// Derived Quantities
// ============================================================================

/// Values computed from a parameter combination before slot filling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedQuantities {
    /// Width of the plate-driven part of the top boundary, rounded to the
    /// metre (m). The continental block starts here.
    pub oceanic_x_extent: f64,
    /// Continental heat production (W/m³)
    pub continent_heating_w_m3: f64,
    pub gradients: GradientCoefficients,
}

impl DerivedQuantities {
    pub fn new(model: &ModelConstants, parameters: &ParameterSet) -> Self {
        Self {
            oceanic_x_extent: (model.oceanic_fraction * parameters.lateral_extent()).round(),
            continent_heating_w_m3: parameters.continent_heat_production()
                * model.continent_heating_scale,
            gradients: GradientCoefficients::new(model, parameters.mantle_start_temperature()),
        }
    }
}

// ============================================================================
// Context
// ============================================================================

/// Placeholder values for one run.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    values: BTreeMap<&'static str, String>,
}

impl TemplateContext {
    pub fn for_run(model: &ModelConstants, run: &SweepRun, output_directory: &str) -> Self {
        let p = &run.parameters;
        let derived = DerivedQuantities::new(model, p);
        let g = derived.gradients;

        let mut ctx = Self::default();
        ctx.set("run_index", run.index.to_string());
        ctx.set("output_directory", output_directory.to_string());
        ctx.set_num("x_extent", p.lateral_extent());
        ctx.set_num("y_extent", model.height_m);
        ctx.set_num("oceanic_x_extent", derived.oceanic_x_extent);
        ctx.set_num("convection_speed", p.convection_speed());
        ctx.set_num("start_temperature", p.mantle_start_temperature());
        ctx.set_num("continent_thickness", p.continent_thickness());
        ctx.set("continent_heating", format!("{:e}", derived.continent_heating_w_m3));
        ctx.set_num("continent_density", model.continent_density);
        ctx.set_num("mantle_density", model.mantle_density);
        ctx.set("mantle_heating", format!("{:e}", model.mantle_heating_w_m3));
        ctx.set_num("surface_temperature", model.surface_temperature_k);
        ctx.set_num("cmb_temperature", model.cmb_temperature_k);
        ctx.set_num("boundary_layer_fraction", model.boundary_layer_fraction);
        ctx.set_num("heat_a", g.a);
        ctx.set_num("heat_b", g.b);
        ctx.set_num("heat_c", g.c);
        ctx.set_num("heat_d", g.d);
        ctx.set_num("perturbation_amplitude", model.perturbation_amplitude);
        ctx.set_num("perturbation_wavelength", model.perturbation_wavelength_m);
        ctx.set("perturbation_mode", model.perturbation_mode.to_string());
        ctx.set_num("end_time", model.end_time_years);
        ctx.set("global_refinement", model.global_refinement.to_string());
        ctx.set("x_repetitions", model.x_repetitions.to_string());
        ctx.set_num("output_interval", model.output_interval_years);
        ctx
    }

    pub fn set(&mut self, key: &'static str, value: String) {
        self.values.insert(key, value);
    }

    fn set_num(&mut self, key: &'static str, value: f64) {
        self.set(key, format_value(value));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

// ============================================================================
// Template
// ============================================================================

/// A solver input template with `{{name}}` placeholders.
#[derive(Debug, Clone)]
pub struct PrmTemplate {
    text: String,
    pattern: Regex,
}

impl PrmTemplate {
    /// The built-in box model template.
    pub fn builtin() -> Result<Self, SweepError> {
        Self::parse(BUILTIN_TEMPLATE.to_string())
    }

    /// Load a user template. Unknown placeholders are rejected up front.
    pub fn from_file(path: &Path) -> Result<Self, SweepError> {
        let text = std::fs::read_to_string(path).map_err(|e| SweepError::io(path, e))?;
        Self::parse(text)
    }

    pub fn parse(text: String) -> Result<Self, SweepError> {
        let template = Self {
            text,
            pattern: Regex::new(PLACEHOLDER_PATTERN)?,
        };
        if let Some(unknown) = template
            .placeholders()
            .into_iter()
            .find(|name| !PLACEHOLDERS.contains(&name.as_str()))
        {
            return Err(SweepError::UnknownPlaceholder(unknown));
        }
        Ok(template)
    }

    /// Distinct placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in self.pattern.captures_iter(&self.text) {
            let name = &caps[1];
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Fill every placeholder from `context`.
    pub fn render(&self, context: &TemplateContext) -> Result<String, SweepError> {
        if let Some(missing) = self
            .placeholders()
            .into_iter()
            .find(|name| context.get(name).is_none())
        {
            return Err(SweepError::UnknownPlaceholder(missing));
        }

        let rendered = self
            .pattern
            .replace_all(&self.text, |caps: &regex::Captures<'_>| {
                context.get(&caps[1]).unwrap_or_default().to_string()
            });
        Ok(rendered.into_owned())
    }
}
