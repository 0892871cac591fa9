//! Preparation countdowns
//!
//! Every in-progress order gets `prep_time_minutes` (kitchen-wide) plus its
//! own extra minutes. The countdown is recomputed from wall-clock time on
//! every sweep, so nothing drifts if a sweep is skipped.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Utc};
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use super::{KitchenOrder, OrderStatus};

const CLOCK_PERIOD: Duration = Duration::from_secs(15);
const SWEEP_PERIOD: Duration = Duration::from_secs(1);

/// Whole seconds since the order was created; a missing timestamp means "just now"
fn elapsed_seconds(order: &KitchenOrder, now: DateTime<Utc>) -> i64 {
    let created = order.created_time().unwrap_or(now);
    let millis = (now - created).num_milliseconds();
    millis.div_euclid(1000)
}

/// Seconds left before the order exceeds its preparation budget
pub fn remaining_seconds(order: &KitchenOrder, prep_minutes: u32, now: DateTime<Utc>) -> u64 {
    let allowed = f64::from(prep_minutes) * 60.0 + order.extra_prep_minutes() * 60.0;
    let remaining = allowed - elapsed_seconds(order, now) as f64;
    remaining.max(0.0) as u64
}

/// Short label for the card badge
pub fn format_countdown(seconds: u64) -> String {
    match seconds {
        0 => "Ready".to_string(),
        1..60 => "1 min".to_string(),
        s => format!("{} min", s / 60),
    }
}

/// `MM:SS` since the order came in
pub fn format_elapsed(seconds: i64) -> String {
    let s = seconds.max(0);
    format!("{:02}:{:02}", s / 60, s % 60)
}

/// `HH:MM` wall clock for the dashboard header
pub fn clock_label<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    now.format("%H:%M").to_string()
}

/// Countdown state of one in-progress order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub countdown_seconds: u64,
    /// Budget exhausted while the order is still being prepared
    pub is_warning: bool,
    pub elapsed_time: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTimerView {
    pub order: KitchenOrder,
    pub status: OrderStatus,
    /// `None` for orders that are ready or closed
    pub countdown: Option<Countdown>,
}

/// Result of one pass over the order list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerSweep {
    pub orders: Vec<OrderTimerView>,
    pub has_overdue: bool,
}

/// Recompute countdowns for every order.
pub fn update_timers(orders: &[KitchenOrder], prep_minutes: u32, now: DateTime<Utc>) -> TimerSweep {
    let mut has_overdue = false;

    let orders = orders
        .iter()
        .map(|order| {
            let status = order.status();
            let countdown = status.is_in_progress().then(|| {
                let remaining = remaining_seconds(order, prep_minutes, now);
                let is_warning = remaining == 0;
                has_overdue |= is_warning;
                Countdown {
                    countdown_seconds: remaining,
                    is_warning,
                    elapsed_time: format_elapsed(elapsed_seconds(order, now)),
                }
            });
            OrderTimerView {
                order: order.clone(),
                status,
                countdown,
            }
        })
        .collect();

    TimerSweep {
        orders,
        has_overdue,
    }
}

/// Shared handle to the live order list
pub type OrderList = Arc<RwLock<Vec<KitchenOrder>>>;

/// Background tasks publishing the header clock and countdown sweeps.
///
/// Starting a task again replaces the running one.
pub struct OrderTimers {
    prep_minutes: watch::Receiver<u32>,
    clock_tx: watch::Sender<String>,
    sweep_tx: watch::Sender<TimerSweep>,
    clock_task: Option<JoinHandle<()>>,
    sweep_task: Option<JoinHandle<()>>,
}

impl OrderTimers {
    /// `prep_minutes` follows the kitchen-wide preparation time setting
    pub fn new(prep_minutes: watch::Receiver<u32>) -> Self {
        let (clock_tx, _) = watch::channel(String::new());
        let (sweep_tx, _) = watch::channel(TimerSweep::default());
        Self {
            prep_minutes,
            clock_tx,
            sweep_tx,
            clock_task: None,
            sweep_task: None,
        }
    }

    pub fn clock(&self) -> watch::Receiver<String> {
        self.clock_tx.subscribe()
    }

    pub fn sweeps(&self) -> watch::Receiver<TimerSweep> {
        self.sweep_tx.subscribe()
    }

    /// Publish the clock now and every 15 seconds.
    pub fn start_clock(&mut self) {
        if let Some(task) = self.clock_task.take() {
            task.abort();
        }

        let clock_tx = self.clock_tx.clone();
        self.clock_task = Some(tokio::spawn(async move {
            let mut ticker = interval(CLOCK_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                clock_tx.send_replace(clock_label(&Local::now()));
            }
        }));
    }

    /// Sweep `orders` now and every second.
    pub fn start_order_timers(&mut self, orders: OrderList) {
        if let Some(task) = self.sweep_task.take() {
            task.abort();
        }

        let sweep_tx = self.sweep_tx.clone();
        let prep_minutes = self.prep_minutes.clone();
        self.sweep_task = Some(tokio::spawn(async move {
            let mut ticker = interval(SWEEP_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let budget = *prep_minutes.borrow();
                let sweep = update_timers(&orders.read().await, budget, Utc::now());
                if sweep.has_overdue && !sweep_tx.borrow().has_overdue {
                    tracing::info!("Orders past their preparation budget");
                }
                sweep_tx.send_replace(sweep);
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.clock_task.take() {
            task.abort();
        }
        if let Some(task) = self.sweep_task.take() {
            task.abort();
        }
    }
}

impl Drop for OrderTimers {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn order(status: &str, age: TimeDelta, now: DateTime<Utc>) -> KitchenOrder {
        KitchenOrder {
            id: "1".to_string(),
            status: Some(status.to_string()),
            created_at: Some(now - age),
            ..Default::default()
        }
    }

    #[test]
    fn remaining_uses_kitchen_budget() {
        let now = Utc::now();
        let o = order("Nouvelle", TimeDelta::seconds(90), now);
        assert_eq!(remaining_seconds(&o, 10, now), 600 - 90);
    }

    #[test]
    fn additional_prep_time_extends_budget() {
        let now = Utc::now();
        let mut o = order("En cours", TimeDelta::minutes(12), now);
        o.additional_prep_time = Some(5.0);
        o.prep_time = Some(30.0);
        assert_eq!(remaining_seconds(&o, 10, now), 3 * 60);

        o.additional_prep_time = None;
        assert_eq!(remaining_seconds(&o, 10, now), 28 * 60);
    }

    #[test]
    fn remaining_never_negative() {
        let now = Utc::now();
        let o = order("Nouvelle", TimeDelta::hours(2), now);
        assert_eq!(remaining_seconds(&o, 10, now), 0);
    }

    #[test]
    fn missing_creation_time_counts_from_now() {
        let now = Utc::now();
        let o = KitchenOrder::default();
        assert_eq!(remaining_seconds(&o, 15, now), 15 * 60);
    }

    #[test]
    fn client_timestamp_alone_counts_as_overdue() {
        let now = Utc::now();
        let o = KitchenOrder {
            id: "1".to_string(),
            status: Some("Nouvelle".to_string()),
            created_at_ms: Some((now - TimeDelta::minutes(30)).timestamp_millis()),
            ..Default::default()
        };

        assert_eq!(remaining_seconds(&o, 10, now), 0);
        let sweep = update_timers(&[o], 10, now);
        assert!(sweep.has_overdue);
        assert_eq!(sweep.orders[0].countdown.as_ref().unwrap().elapsed_time, "30:00");
    }

    #[test]
    fn client_timestamp_takes_precedence() {
        let now = Utc::now();
        let mut o = order("Nouvelle", TimeDelta::minutes(30), now);
        o.created_at_ms = Some((now - TimeDelta::minutes(4)).timestamp_millis());
        assert_eq!(remaining_seconds(&o, 10, now), 6 * 60);
    }

    #[test]
    fn countdown_labels() {
        assert_eq!(format_countdown(0), "Ready");
        assert_eq!(format_countdown(1), "1 min");
        assert_eq!(format_countdown(59), "1 min");
        assert_eq!(format_countdown(60), "1 min");
        assert_eq!(format_countdown(599), "9 min");
    }

    #[test]
    fn elapsed_label_is_zero_padded() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(65), "01:05");
        assert_eq!(format_elapsed(-3), "00:00");
    }

    #[test]
    fn clock_label_is_hours_minutes() {
        let t = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 59).unwrap();
        assert_eq!(clock_label(&t), "07:05");
    }

    #[test]
    fn sweep_flags_overdue_in_progress_orders_only() {
        let now = Utc::now();
        let orders = vec![
            order("Nouvelle", TimeDelta::minutes(3), now),
            order("En cours", TimeDelta::minutes(30), now),
            order("Prêt", TimeDelta::minutes(45), now),
        ];

        let sweep = update_timers(&orders, 10, now);

        assert!(sweep.has_overdue);
        let fresh = sweep.orders[0].countdown.as_ref().unwrap();
        assert_eq!(fresh.countdown_seconds, 7 * 60);
        assert!(!fresh.is_warning);
        assert_eq!(fresh.elapsed_time, "03:00");

        let late = sweep.orders[1].countdown.as_ref().unwrap();
        assert!(late.is_warning);
        assert_eq!(late.elapsed_time, "30:00");

        assert_eq!(sweep.orders[2].status, OrderStatus::Ready);
        assert!(sweep.orders[2].countdown.is_none());
    }

    #[test]
    fn sweep_without_overdue() {
        let now = Utc::now();
        let orders = vec![order("Nouvelle", TimeDelta::minutes(1), now)];
        assert!(!update_timers(&orders, 10, now).has_overdue);
    }

    #[tokio::test]
    async fn background_sweep_publishes_immediately() {
        let (_budget_tx, budget_rx) = watch::channel(10);
        let mut timers = OrderTimers::new(budget_rx);
        let mut sweeps = timers.sweeps();

        let now = Utc::now();
        let orders: OrderList = Arc::new(RwLock::new(vec![order(
            "Nouvelle",
            TimeDelta::minutes(20),
            now,
        )]));
        timers.start_order_timers(orders);

        sweeps.changed().await.unwrap();
        assert!(sweeps.borrow().has_overdue);
        timers.stop();
    }

    #[tokio::test]
    async fn clock_publishes_immediately() {
        let (_budget_tx, budget_rx) = watch::channel(10);
        let mut timers = OrderTimers::new(budget_rx);
        let mut clock = timers.clock();

        timers.start_clock();
        clock.changed().await.unwrap();
        assert_eq!(clock.borrow().len(), 5);
    }
}
