//! Trigger lookup and the trigger section of a table.

use std::collections::HashMap;

use tracing::debug;

use crate::core::identifier::quote_ident;
use crate::core::TriggerRecord;
use crate::error::Result;
use crate::source::DumpSource;

use super::template::section_banner;

/// All triggers of the server, grouped by (database, table).
///
/// Filled by a single enumeration query on first use and kept for the rest
/// of the dump session.
#[derive(Debug, Default)]
pub struct TriggerCache {
    by_table: Option<HashMap<(String, String), Vec<TriggerRecord>>>,
}

impl TriggerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers owned by `database.table`, in definition order.
    pub async fn triggers_for<S>(
        &mut self,
        source: &mut S,
        database: &str,
        table: &str,
    ) -> Result<&[TriggerRecord]>
    where
        S: DumpSource + ?Sized,
    {
        if self.by_table.is_none() {
            let all = source.list_triggers().await?;
            debug!("Fetched {} triggers", all.len());
            self.by_table = Some(group_by_table(all));
        }

        let key = (database.to_string(), table.to_string());
        Ok(self
            .by_table
            .as_ref()
            .and_then(|map| map.get(&key))
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }
}

fn group_by_table(all: Vec<TriggerRecord>) -> HashMap<(String, String), Vec<TriggerRecord>> {
    let mut map: HashMap<(String, String), Vec<TriggerRecord>> = HashMap::new();
    for trigger in all {
        map.entry((trigger.database.clone(), trigger.table.clone()))
            .or_default()
            .push(trigger);
    }
    map
}

/// Render the trigger section for `table`. Empty when there are no triggers.
pub fn render_triggers(table: &str, triggers: &[TriggerRecord]) -> Result<String> {
    if triggers.is_empty() {
        return Ok(String::new());
    }

    let quoted_table = quote_ident(table)?;
    let mut out = section_banner(&format!("Triggers of {}", table));
    for trigger in triggers {
        out.push_str("DELIMITER ;;\n");
        out.push_str("/*!50003 SET SESSION SQL_MODE=\"\" */;;\n");
        out.push_str(&format!(
            "/*!50003 CREATE TRIGGER {} {} {} ON {} FOR EACH ROW {} */;;\n",
            quote_ident(&trigger.name)?,
            trigger.timing,
            trigger.event,
            quoted_table,
            trigger.statement
        ));
        out.push_str("DELIMITER ;\n");
        out.push_str("/*!50003 SET SESSION SQL_MODE=@OLD_SQL_MODE */;\n\n");
    }
    Ok(out)
}
