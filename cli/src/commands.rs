use chrono::{DateTime, Local, Utc};
use orderbell_core::audio::{ContextState, SynthesisContext};
use orderbell_core::context::AppConfigExt;
use orderbell_core::orders::{
    KitchenOrder, OrderStatus, format_countdown, format_elapsed, parse_items_str,
    remaining_seconds,
};
use std::io::Write;

use crate::CliContext;

pub async fn play(id: &str, ctx: &CliContext) -> Result<(), String> {
    ctx.sounds.play(id).await;
    let state = ctx.sounds.lifecycle().context().map(|c| c.state());
    println!("{}", play_outcome(id, ctx.sounds.is_active(id), state));
    Ok(())
}

/// Report for `play`, judged from the context itself: the gate task may not
/// have seen this line's gesture yet.
fn play_outcome(id: &str, active: bool, state: Option<ContextState>) -> String {
    match (active, state) {
        (true, _) => format!("chime playing for order {id}"),
        (false, None) => "no audio output available".to_string(),
        (false, Some(ContextState::Running)) => format!("chime not started for order {id}"),
        (false, Some(state)) => format!("audio is {state}; chime not started for order {id}"),
    }
}

pub fn stop(id: &str, ctx: &CliContext) {
    ctx.sounds.stop(id);
    println!("stopped chime for order {id}");
}

pub fn stop_all(ctx: &CliContext) {
    let count = ctx.sounds.active_count();
    ctx.sounds.stop_all();
    println!("stopped {count} chime(s)");
}

pub fn show_active(ctx: &CliContext) {
    println!("{} active chime(s)", ctx.sounds.active_count());
}

pub fn show_status(label: &str) {
    let status = OrderStatus::canonicalize(label);
    println!(
        "{status} (card: {}, next: {})",
        status.display_label(),
        status.next_label()
    );
}

pub fn show_items(json: &str) {
    let items = parse_items_str(json);
    if items.is_empty() {
        println!("no items");
        return;
    }

    for item in items {
        print!("{}x {}", item.quantity, item.name);
        if let Some(drink) = &item.boisson_name {
            print!(" + {drink}");
        }
        if let Some(side) = &item.accompagnement_name {
            print!(" + {side}");
        }
        if !item.customizations.is_empty() {
            print!(" ({} customization(s))", item.customizations.len());
        }
        println!();
    }
}

pub async fn show_countdown(
    created: Option<&str>,
    extra: Option<f64>,
    ctx: &CliContext,
) -> Result<(), String> {
    let created_at = created
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| format!("invalid --created timestamp: {e}"))
        })
        .transpose()?;

    let order = KitchenOrder {
        created_at,
        additional_prep_time: extra,
        ..Default::default()
    };

    let now = Utc::now();
    let prep_minutes = ctx.config.read().await.kitchen.prep_time_minutes;
    let remaining = remaining_seconds(&order, prep_minutes, now);
    let elapsed = (now - created_at.unwrap_or(now)).num_seconds();

    println!(
        "{} remaining ({remaining}s), elapsed {}",
        format_countdown(remaining),
        format_elapsed(elapsed)
    );
    Ok(())
}

pub async fn show_hours(ctx: &CliContext) {
    let hours = ctx.hours.read().await;

    println!("{:<10} {:<13} Evening", "Day", "Lunch");
    println!("{}", "-".repeat(36));
    for day in hours.schedule() {
        if day.is_closed {
            println!("{:<10} closed", day.day_name);
            continue;
        }
        let lunch = window_label(&day.open_time_lunch, &day.close_time_lunch);
        let evening = window_label(&day.open_time_evening, &day.close_time_evening);
        println!("{:<10} {:<13} {}", day.day_name, lunch, evening);
    }

    let state = if hours.is_open_now() { "open" } else { "closed" };
    println!("\n{} - currently {state}", Local::now().format("%H:%M"));
}

fn window_label(open: &str, close: &str) -> String {
    if open.is_empty() || close.is_empty() {
        return "-".to_string();
    }
    format!(
        "{}-{}",
        open.get(..5).unwrap_or(open),
        close.get(..5).unwrap_or(close)
    )
}

pub async fn show_settings(ctx: &CliContext) {
    let config = ctx.config.read().await;
    let chime = &config.chime;

    println!(
        "chime: {} ({} Hz / {} Hz, gain {})",
        if chime.enabled { "enabled" } else { "disabled" },
        chime.high_tone_hz,
        chime.low_tone_hz,
        chime.master_gain
    );
    println!(
        "pulse every {}ms, auto-stop after {}ms",
        chime.pulse_interval_ms, chime.auto_stop_ms
    );
    println!("prep time: {} min", config.kitchen.prep_time_minutes);
    match config.hours_path() {
        Some(path) => println!("hours file: {}", path.display()),
        None => println!("hours file: none (default week)"),
    }
}

pub async fn set_prep_time(minutes: u32, ctx: &CliContext) -> Result<(), String> {
    let mut config = ctx.config.write().await;
    config.kitchen.prep_time_minutes = minutes;
    config.save().map_err(|e| e.to_string())?;
    println!("prep time set to {minutes} min");
    Ok(())
}

pub fn exit() -> Result<(), String> {
    write!(std::io::stdout(), "quitting...").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())
}
