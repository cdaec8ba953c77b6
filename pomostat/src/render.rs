//! Terminal rendering for `--format text`.

use chrono::{Datelike, Duration, NaiveDate};
use pomostat_core::analytics::{
    delta_pct, format_delta, DonutEntry, DonutSet, Granularity, HeatmapReport, PeriodReport,
    PeriodWindow, SummaryReport,
};
use pomostat_core::SubjectId;

const WIDTH: usize = 60;

fn header(title: &str) {
    println!();
    println!("╭{}╮", "─".repeat(WIDTH));
    println!("│{:^60}│", title);
    println!("╰{}╯", "─".repeat(WIDTH));
    println!();
}

fn window_label(today: NaiveDate, granularity: Granularity) -> String {
    match PeriodWindow::current(today, granularity) {
        Ok(window) => format!("{} ({})", granularity.as_str().to_uppercase(), window),
        Err(_) => granularity.as_str().to_uppercase(),
    }
}

pub fn print_summary(summary: &SummaryReport, subject: SubjectId, today: NaiveDate) {
    header(&format!("Summary for subject {}", subject));

    for granularity in Granularity::ALL {
        println!("{}", window_label(today, granularity));
        print_period(summary.get(granularity));
        println!();
    }
}

fn print_period(report: &PeriodReport) {
    let focus = report.focus_total();
    let pomo = report.pomo_total();

    println!(
        "   Tasks done: {:<10} {} vs previous ({})",
        report.done,
        format_delta(delta_pct(report.done as f64, report.prev_tasks as f64)),
        report.prev_tasks
    );
    println!(
        "   Focus:      {:<10} {} vs previous ({:.2}h)",
        format!("{:.2}h", focus),
        format_delta(delta_pct(focus, report.prev_focus)),
        report.prev_focus
    );
    println!(
        "   Pomodoros:  {:<10} {} vs previous ({})",
        pomo,
        format_delta(delta_pct(pomo as f64, report.prev_pomo as f64)),
        report.prev_pomo
    );
    println!(
        "   Streak:     {:<10} best {}",
        report.streak, report.best_streak
    );
    println!("   Created:    {} (approximate)", report.created);
    println!("   Tasks:      {}", sparkline(&report.tasks));
}

/// One block character per bucket, scaled to the largest bucket.
fn sparkline(values: &[i64]) -> String {
    const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let max = values.iter().copied().max().unwrap_or(0);
    values
        .iter()
        .map(|v| {
            if max == 0 || *v == 0 {
                ' '
            } else {
                let idx = ((*v as f64 / max as f64) * (BLOCKS.len() - 1) as f64).round() as usize;
                BLOCKS[idx.min(BLOCKS.len() - 1)]
            }
        })
        .collect()
}

pub fn print_donut(donut: &DonutSet, subject: SubjectId, today: NaiveDate) {
    header(&format!("Categories for subject {}", subject));

    for granularity in Granularity::ALL {
        let report = donut.get(granularity);
        println!("{}", window_label(today, granularity));

        if report.tasks.is_empty() && report.focus.is_empty() {
            println!("   No activity found for this period.");
            println!();
            continue;
        }

        print_entries("Tasks", &report.tasks, |v| v.to_string());
        print_entries("Focus", &report.focus, |v| format!("{:.1}h", v));
        println!();
    }
}

fn print_entries<V>(title: &str, entries: &[DonutEntry<V>], fmt: impl Fn(&V) -> String) {
    if entries.is_empty() {
        return;
    }
    println!("   {}", title);
    for entry in entries {
        println!("     {:<24} {:>8}  {}", entry.name, fmt(&entry.value), entry.color);
    }
}

pub fn print_heatmap(heatmap: &HeatmapReport, subject: SubjectId, today: NaiveDate) {
    header(&format!("Activity for subject {}", subject));

    let total_tasks: i64 = heatmap.tasks.values().sum();
    let total_focus: f64 = heatmap.focus.values().sum();
    println!(
        "   Tasks done: {:<10} Focus: {:.1}h",
        total_tasks, total_focus
    );
    println!(
        "   Active days: {:<9} Busiest day: {} tasks",
        heatmap.active_days(),
        heatmap.peak_tasks()
    );
    println!();

    // Rows are weekdays, columns are weeks, oldest on the left
    let peak = heatmap.peak_tasks();
    let first = today - Duration::days(364);
    let offset = first.weekday().num_days_from_monday() as i64;
    let weeks = (364 + offset) / 7 + 1;
    for weekday in 0..7i64 {
        let row: String = (0..weeks)
            .map(|week| {
                let day = first + Duration::days(week * 7 + weekday - offset);
                if day < first || day > today {
                    return ' ';
                }
                let count = heatmap
                    .tasks
                    .get(&day.format("%Y-%m-%d").to_string())
                    .copied()
                    .unwrap_or(0);
                shade(count, peak)
            })
            .collect();
        println!("   {}", row);
    }
    println!();
}

fn shade(count: i64, peak: i64) -> char {
    if count == 0 || peak == 0 {
        return '·';
    }
    match count * 4 / peak {
        0 => '░',
        1 => '▒',
        2 | 3 => '▓',
        _ => '█',
    }
}
