//! Machine command handlers.

use std::fmt::Write as _;

use strum::IntoEnumIterator;
use tabled::Tabled;

use forgewatch_core::detail::{anomaly_badge, health_analysis, readings};
use forgewatch_core::{
    Backend, DashboardState, Machine, MachineStatistics, MachineType, Severity, Ticket,
    Transition, display_value,
};

use crate::cli::{GlobalOpts, MachineListArgs, MachinesArgs, MachinesCommand, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct MachineRow {
    #[tabled(rename = "Machine")]
    machine_id: String,
    #[tabled(rename = "Type")]
    machine_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Air K")]
    air: String,
    #[tabled(rename = "Process K")]
    process: String,
    #[tabled(rename = "RPM")]
    rpm: String,
    #[tabled(rename = "Torque Nm")]
    torque: String,
    #[tabled(rename = "Wear min")]
    wear: String,
    #[tabled(rename = "Issues")]
    issues: usize,
}

impl MachineRow {
    fn new(m: &Machine, color: bool) -> Self {
        Self {
            machine_id: m.machine_id.clone(),
            machine_type: m.machine_type.map(|t| t.label().to_owned()).unwrap_or_default(),
            status: output::health(m.status(), color),
            severity: output::severity(m.severity(), color),
            air: format!("{:.1}", m.air_temperature),
            process: format!("{:.1}", m.process_temperature),
            rpm: format!("{:.0}", m.rotational_speed),
            torque: format!("{:.1}", m.torque),
            wear: format!("{:.0}", m.tool_wear),
            issues: m.anomalies().len(),
        }
    }
}

fn detail(m: &Machine, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Machine:   {}", m.machine_id);
    let _ = writeln!(
        out,
        "Type:      {}",
        m.machine_type.map_or("-", MachineType::label)
    );
    let _ = writeln!(out, "Status:    {}", output::health(m.status(), color));
    let _ = writeln!(out, "Severity:  {}", output::severity(m.severity(), color));

    let _ = writeln!(out, "\nReadings");
    for reading in readings(m) {
        let marker = if reading.over_limit() { "  ⚠ over limit" } else { "" };
        let _ = writeln!(out, "  {:<20} {}{marker}", reading.label, reading.display());
    }

    let _ = writeln!(out, "\nPrediction");
    let _ = writeln!(out, "  {}", health_analysis(m));

    if let Some(diag) = m.condition.as_ref().and_then(|c| c.diagnostics.as_ref()) {
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

    if let Some(badge) = anomaly_badge(m) {
        let _ = writeln!(out, "\nDetected Anomalies ({badge})");
        for anomaly in m.anomalies() {
            let _ = writeln!(
                out,
                "  {} [{}]  value {}  normal {}",
                anomaly.parameter,
                output::severity(anomaly.status, color),
                display_value(&anomaly.value),
                display_value(&anomaly.normal_range),
            );
            if let Some(ref why) = anomaly.explanation {
                let _ = writeln!(out, "    {why}");
            }
        }
    }
    out.trim_end().to_owned()
}

fn stats_detail(s: &MachineStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Machines:          {}", s.total_unique_machines);
    let _ = writeln!(out, "Records processed: {}", s.total_records_processed);

    let _ = writeln!(out, "\nProduct types");
    for t in MachineType::iter() {
        let _ = writeln!(
            out,
            "  {:<8} {:>6}  ({:.1}%)",
            t.label(),
            s.type_count(t),
            s.type_share(t)
        );
    }

    let status = &s.prediction_summary.status;
    let _ = writeln!(out, "\nPredictions");
    let _ = writeln!(out, "  Healthy  {:>6}", status.healthy);
    let _ = writeln!(out, "  Failure  {:>6}", status.failure);

    let _ = writeln!(out, "\nSeverity");
    for sev in Severity::FILTERABLE {
        let _ = writeln!(
            out,
            "  {:<8} {:>6}",
            sev.label(),
            s.prediction_summary.severity.get(sev)
        );
    }

    let _ = writeln!(out, "\nAverages");
    let _ = writeln!(out, "  Air temperature      {:.2} K", s.avg_air_temp);
    let _ = writeln!(out, "  Process temperature  {:.2} K", s.avg_process_temp);
    let _ = writeln!(out, "  Rotational speed     {:.2} RPM", s.avg_rotational_speed);
    let _ = writeln!(out, "  Torque               {:.2} Nm", s.avg_torque);
    let _ = write!(out, "  Tool wear            {:.2} min", s.avg_tool_wear);
    out
}

// ── Query planning ──────────────────────────────────────────────────

/// Drive the dashboard reducer to the requested mode and page.
fn plan(args: &MachineListArgs, limit: u32) -> (DashboardState, Ticket) {
    let mut state = DashboardState::new(limit);
    let mut ticket = state.start();

    let transition = if let Some(ref term) = args.search {
        Some(Transition::SetSearch(term.clone()))
    } else if let Some(t) = args.machine_type {
        Some(Transition::SelectType(Some(t.into())))
    } else if let Some(r) = args.risk {
        Some(Transition::SelectRisk(Some(r.into())))
    } else {
        args.severity
            .map(|s| Transition::SelectSeverity(Some(s.into())))
    };

    for step in transition.into_iter().chain([Transition::GoToPage(args.page)]) {
        if let Some(next) = state.apply(step) {
            ticket = next;
        }
    }
    (state, ticket)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    backend: &Backend,
    args: MachinesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    match args.command {
        MachinesCommand::List(list) => {
            let limit = list.limit.unwrap_or_else(|| backend.page_size());
            let (mut state, ticket) = plan(&list, limit);

            let page = backend.fetch_machines(&ticket.query).await?;
            state.accept::<CliError>(ticket.seq, Ok(page));

            let out = output::render_list(
                &global.output,
                state.machines(),
                |m| MachineRow::new(m, color),
                |m| m.machine_id.clone(),
            );
            output::print_output(&out, global.quiet);

            if matches!(global.output, OutputFormat::Table) {
                if let Some(summary) = state.summary() {
                    let pager: Vec<String> =
                        state.page_items().iter().map(ToString::to_string).collect();
                    util::status(&format!("{summary}\n[{}]", pager.join(" ")), global);
                }
            }
            Ok(())
        }

        MachinesCommand::Get { machine_id } => {
            let machine = backend.machine(&machine_id).await?;
            let out = output::render_single(
                &global.output,
                &machine,
                |m| detail(m, color),
                |m| m.machine_id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MachinesCommand::Stats => {
            let stats = backend.statistics().await?;
            let out = output::render_single(&global.output, &stats, stats_detail, |s| {
                s.total_unique_machines.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
