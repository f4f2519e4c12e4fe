//! Parameter resolution.
//!
//! Final parameter values come from three tiers: caller overrides beat
//! effect-level defaults beat parameter-type defaults. A parameter with no
//! value at any tier is omitted entirely, and overrides for parameters the
//! effect never declared pass through untouched (call sites may feed
//! ad-hoc placeholders).

use serde_json::Value;

use matiz_config::{EffectsConfig, ParamKind, ParamMap, ValidationError};

/// Resolve final parameter values for `effect_name`.
///
/// An unknown effect name returns `overrides` unchanged: the resolver
/// never raises, and existence surfaces at the point of use as a failed
/// execution result.
pub fn resolve_params(
    catalog: &EffectsConfig,
    effect_name: &str,
    overrides: &ParamMap,
) -> ParamMap {
    let Some(effect) = catalog.effect(effect_name) else {
        return overrides.clone();
    };

    let mut resolved = ParamMap::new();
    for (name, definition) in &effect.parameters {
        let value = overrides
            .get(name)
            .cloned()
            .or_else(|| definition.default.clone())
            .or_else(|| {
                catalog
                    .parameter_type(&definition.param_type)
                    .and_then(|parameter_type| parameter_type.default.clone())
            });
        if let Some(value) = value {
            resolved.insert(name.clone(), value);
        }
    }

    for (name, value) in overrides {
        if !effect.parameters.contains_key(name) {
            resolved.insert(name.clone(), value.clone());
        }
    }

    resolved
}

/// Pre-flight check of caller-supplied values against the declared
/// parameter types: kind, pattern, and numeric bounds.
///
/// This is a courtesy for interactive callers (the CLI runs it before
/// executing); the engine itself never does, so resolution semantics stay
/// permissive. Undeclared parameters and unknown effects pass.
pub fn validate_overrides(
    catalog: &EffectsConfig,
    effect_name: &str,
    overrides: &ParamMap,
) -> Result<(), ValidationError> {
    let Some(effect) = catalog.effect(effect_name) else {
        return Ok(());
    };

    for (name, value) in overrides {
        let Some(definition) = effect.parameters.get(name) else {
            continue;
        };

        let parameter_type = catalog.parameter_type(&definition.param_type);
        let kind = parameter_type
            .map(|t| t.kind)
            .or_else(|| ParamKind::from_name(&definition.param_type));

        if let Some(kind) = kind {
            check_kind(kind, name, value)?;
        }

        let Some(parameter_type) = parameter_type else {
            continue;
        };

        if let Some(pattern) = &parameter_type.pattern
            && let Ok(regex) = regex_lite::Regex::new(pattern)
        {
            let text = crate::executor::stringify(value);
            if !regex.is_match(&text) {
                return Err(ValidationError::InvalidValue {
                    param: name.clone(),
                    reason: format!("'{text}' does not match pattern '{pattern}'"),
                });
            }
        }

        if let Some(number) = numeric_value(value) {
            if let Some(min) = parameter_type.min
                && number < min
            {
                return Err(ValidationError::InvalidValue {
                    param: name.clone(),
                    reason: format!("{number} is below the minimum {min}"),
                });
            }
            if let Some(max) = parameter_type.max
                && number > max
            {
                return Err(ValidationError::InvalidValue {
                    param: name.clone(),
                    reason: format!("{number} is above the maximum {max}"),
                });
            }
        }
    }

    Ok(())
}

fn check_kind(kind: ParamKind, name: &str, value: &Value) -> Result<(), ValidationError> {
    let ok = match kind {
        ParamKind::String => true, // any scalar stringifies
        ParamKind::Integer => {
            value.as_i64().is_some()
                || value.as_u64().is_some()
                || value
                    .as_str()
                    .is_some_and(|s| s.parse::<i64>().is_ok())
        }
        ParamKind::Float => {
            value.is_number()
                || value
                    .as_str()
                    .is_some_and(|s| s.parse::<f64>().is_ok())
        }
        ParamKind::Boolean => {
            value.is_boolean() || value.as_str().is_some_and(|s| s == "true" || s == "false")
        }
    };
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            param: name.to_string(),
            reason: format!(
                "expected a {} value, got {value}",
                kind.name()
            ),
        })
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse::<f64>().ok()))
}
