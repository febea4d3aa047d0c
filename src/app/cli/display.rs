//! Delivery summary rendering for `--stats`

use crate::delivery::api::HandlerStats;
use prettytable::{format, row, Table};

/// Render `stats` as a two-column table
pub fn render_stats_table(stats: &HandlerStats) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.set_titles(row![b -> "Handler", stats.name]);

    table.add_row(row!["Worker", stats.phase]);
    table.add_row(row!["Sinks", r -> stats.sinks]);
    table.add_row(row!["Queue capacity", r -> stats.queue.capacity]);
    table.add_row(row!["Still queued", r -> stats.queue.count]);
    table.add_row(row!["Delivered messages", r -> stats.delivered_messages]);
    table.add_row(row!["Delivered batches", r -> stats.delivered_batches]);
    table.add_row(row!["Sink flushes", r -> stats.flushes]);
    table.add_row(row!["Dropped (queue full)", r -> stats.queue.total_drop_count]);
    table.add_row(row!["Ignored (no sink)", r -> stats.ignored]);
    table.add_row(row!["Last delivered seq", r -> stats.last_delivered]);
    let settled = if stats.settled { "yes" } else { "no" };
    table.add_row(row!["Settled", r -> settled]);

    table.to_string()
}
