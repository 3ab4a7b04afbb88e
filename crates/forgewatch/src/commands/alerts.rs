//! Alert command handlers.

use std::fmt::Write as _;

use tabled::Tabled;

use forgewatch_core::{Alert, Backend, ResourceId, display_value};

use crate::cli::{AlertsArgs, AlertsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Machine")]
    machine: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Resolved")]
    resolved: String,
    #[tabled(rename = "Summary")]
    summary: String,
}

impl AlertRow {
    fn new(a: &Alert, color: bool) -> Self {
        Self {
            id: a.id.to_string(),
            machine: a.machine_id.clone().unwrap_or_default(),
            kind: a.type_label(),
            severity: output::severity(a.severity, color),
            created: a
                .created()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            resolved: if a.resolved { "yes".into() } else { "no".into() },
            summary: truncate(a.summary(), 60),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    } else {
        text.to_owned()
    }
}

fn detail(a: &Alert, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID:        {}", a.id);
    let _ = writeln!(out, "Type:      {}", a.type_label());
    let _ = writeln!(out, "Machine:   {}", a.machine_id.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "Severity:  {}", output::severity(a.severity, color));
    let _ = writeln!(out, "Created:   {}", a.created_at.as_deref().unwrap_or("-"));
    if a.resolved {
        let _ = writeln!(
            out,
            "Resolved:  yes{}",
            a.resolved_at
                .as_deref()
                .map(|t| format!(" at {t}"))
                .unwrap_or_default()
        );
        if let Some(ref by) = a.resolved_by {
            let _ = writeln!(out, "           by {by}");
        }
    } else {
        let _ = writeln!(out, "Resolved:  no");
    }
    if let Some(ref message) = a.message {
        let _ = writeln!(out, "\n{message}");
    }

    let Some(ref data) = a.data else {
        return out.trim_end().to_owned();
    };

    if let Some(ref ml) = data.ml_prediction {
        let _ = writeln!(out, "\nPrediction");
        let _ = writeln!(out, "  Result:      {}", display_value(&ml.prediction));
        if let Some(confidence) = ml.confidence_percent() {
            let _ = writeln!(out, "  Confidence:  {confidence}");
        }
        if let Some(ref health) = ml.overall_health {
            let _ = writeln!(out, "  Health:      {health}");
        }
    }
    if let Some(ref diag) = data.diagnostics {
        let _ = writeln!(out, "\nDiagnostics");
        if let Some(ref cause) = diag.primary_cause {
            let _ = writeln!(out, "  Primary cause:  {cause}");
        }
        if let Some(ref alert) = diag.sensor_alert {
            let _ = writeln!(out, "  Alert:          {alert}");
        }
        if let Some(ref action) = diag.recommended_action {
            let _ = writeln!(out, "  Action:         {action}");
        }
    }
    if !data.anomalies.is_empty() {
        let _ = writeln!(out, "\nAnomalies");
        for anomaly in &data.anomalies {
            let _ = writeln!(
                out,
                "  {} [{}]  value {}  normal {}",
                anomaly.parameter,
                output::severity(anomaly.status, color),
                display_value(&anomaly.value),
                display_value(&anomaly.normal_range),
            );
        }
    }
    if let Some(values) = data.machine_data.as_ref().and_then(|d| d.sensor_values) {
        let _ = writeln!(out, "\nSensor values");
        let rows = [
            ("Air temperature", values.air_temperature, "K"),
            ("Process temperature", values.process_temperature, "K"),
            ("Rotational speed", values.rotational_speed, "RPM"),
            ("Torque", values.torque, "Nm"),
            ("Tool wear", values.tool_wear, "min"),
        ];
        for (label, value, unit) in rows {
            if let Some(v) = value {
                let _ = writeln!(out, "  {label:<20} {v} {unit}");
            }
        }
    }
    out.trim_end().to_owned()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    backend: &Backend,
    args: AlertsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    match args.command {
        AlertsCommand::List {
            severity,
            unresolved,
        } => {
            let alerts = backend.alerts(severity.map(Into::into)).await?;
            let shown: Vec<Alert> = alerts
                .into_iter()
                .filter(|a| !unresolved || !a.resolved)
                .collect();
            let out = output::render_list(
                &global.output,
                &shown,
                |a| AlertRow::new(a, color),
                |a| a.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AlertsCommand::Get { id } => {
            let alert = backend.alert(&ResourceId::from(id.as_str())).await?;
            let out = output::render_single(
                &global.output,
                &alert,
                |a| detail(a, color),
                |a| a.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AlertsCommand::Resolve { id } => resolve(backend, &id, global).await,
    }
}

async fn resolve(backend: &Backend, id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let alert = backend.alert(&ResourceId::from(id)).await?;
    if alert.resolved {
        util::status(&format!("Alert {} is already resolved", alert.id), global);
        return Ok(());
    }
    let id = alert.id;

    let prompt = format!("Resolve alert {id}?");
    if !util::confirm(&prompt, "alerts resolve", global.yes)? {
        util::status("Aborted", global);
        return Ok(());
    }

    backend.resolve_alert(&id).await?;
    util::status(&format!("✓ Alert {id} resolved"), global);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_summaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijk", 5), "abcd…");
    }
}
