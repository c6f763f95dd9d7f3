//! Explicitly owned dashboard state.
//!
//! The caller creates a `Dashboard` when a session mounts, passes it where
//! it is needed, and drops it on navigation. There are no module-level
//! singletons. The store stays authoritative: everything here is an
//! optimistically updated cache with last-write-wins semantics.

use crate::normalize::normalize_lead;
use crate::patch::Patch;
use crate::types::{ActivityNote, Lead, STATUS_WON, Worksheet};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Default)]
pub struct Dashboard {
    leads: Vec<Lead>,
    worksheets: HashMap<u64, Worksheet>,
    notes: HashMap<u64, Vec<ActivityNote>>,
}

impl Dashboard {
    pub fn new() -> Self {
        Dashboard::default()
    }

    /// Swaps in a freshly fetched listing, keeping store order.
    pub fn replace_leads(&mut self, leads: Vec<Lead>) {
        self.leads = leads;
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn lead(&self, id: u64) -> Option<&Lead> {
        self.leads.iter().find(|lead| lead.id == id)
    }

    /// Re-applies an acknowledged patch to the cached copy, then re-runs
    /// the normalizer so cleared policy fields pick their defaults back
    /// up. Returns false when the id is not in the cache.
    pub fn apply_patch(&mut self, patch: &Patch) -> bool {
        let Some(lead) = self.leads.iter_mut().find(|lead| lead.id == patch.id) else {
            return false;
        };

        let Ok(serde_json::Value::Object(mut raw)) = serde_json::to_value(&*lead) else {
            return false;
        };
        for (key, value) in &patch.fields {
            raw.insert(key.clone(), value.clone());
        }
        *lead = normalize_lead(&raw);
        true
    }

    pub fn replace_worksheets(&mut self, worksheets: HashMap<u64, Worksheet>) {
        self.worksheets = worksheets;
    }

    pub fn worksheet(&self, id: u64) -> Option<&Worksheet> {
        self.worksheets.get(&id)
    }

    pub fn put_worksheet(&mut self, id: u64, worksheet: Worksheet) {
        self.worksheets.insert(id, worksheet);
    }

    /// Records a session-scoped note against a lead. The id is derived
    /// from the clock, like the original page did.
    pub fn add_note(&mut self, lead_id: u64, text: String, agent: String) -> ActivityNote {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let note = ActivityNote {
            id: millis,
            text,
            created_at: millis.to_string(),
            agent,
        };
        self.notes.entry(lead_id).or_default().push(note.clone());
        note
    }

    pub fn notes(&self, lead_id: u64) -> &[ActivityNote] {
        self.notes
            .get(&lead_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Client-side listing predicates. Every predicate left as None matches
/// everything; order of the input is preserved.
#[derive(Clone, Debug, Default)]
pub struct LeadFilter {
    pub status: Option<String>,
    pub agent: Option<String>,
    pub search: Option<String>,
}

impl LeadFilter {
    /// The customers view: leads whose workflow reached "Won". A filter,
    /// not a separate entity.
    pub fn won() -> Self {
        LeadFilter {
            status: Some(STATUS_WON.to_string()),
            ..LeadFilter::default()
        }
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(status) = &self.status
            && &lead.status != status
        {
            return false;
        }
        if let Some(agent) = &self.agent
            && &lead.agent != agent
        {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() {
                let haystack = [
                    &lead.name,
                    &lead.email,
                    &lead.phone,
                    &lead.zip,
                    &lead.vehicles,
                ]
                .iter()
                .map(|part| part.to_lowercase())
                .collect::<Vec<_>>()
                .join(" ");
                if !haystack.contains(&needle) {
                    return false;
                }
            }
        }
        true
    }

    pub fn apply<'a>(&self, leads: &'a [Lead]) -> Vec<&'a Lead> {
        leads.iter().filter(|lead| self.matches(lead)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::DEFAULT_COVERAGE;
    use crate::patch::build_patch;
    use serde_json::{Map, Value, json};

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn lead(id: u64, name: &str, status: &str, agent: &str) -> Lead {
        Lead {
            id,
            name: name.to_string(),
            status: status.to_string(),
            agent: agent.to_string(),
            ..Lead::default()
        }
    }

    #[test]
    fn apply_patch_updates_the_cached_lead() {
        let mut dashboard = Dashboard::new();
        dashboard.replace_leads(vec![lead(5, "Jane", "New", "")]);

        let patch = build_patch(fields(json!({"id": 5, "agent": "Kelly", "status": "Quoted"})))
            .unwrap();
        assert!(dashboard.apply_patch(&patch));

        let cached = dashboard.lead(5).unwrap();
        assert_eq!(cached.agent, "Kelly");
        assert_eq!(cached.status, "Quoted");
        assert_eq!(cached.name, "Jane");
    }

    #[test]
    fn apply_patch_renormalizes_cleared_policy_fields() {
        let mut dashboard = Dashboard::new();
        let mut won = lead(9, "Ann", "Won", "Brandon");
        won.coverage = "Liability Only".to_string();
        dashboard.replace_leads(vec![won]);

        let patch = build_patch(fields(json!({"id": 9, "coverage": ""}))).unwrap();
        assert!(dashboard.apply_patch(&patch));
        assert_eq!(dashboard.lead(9).unwrap().coverage, DEFAULT_COVERAGE);
    }

    #[test]
    fn apply_patch_misses_unknown_ids() {
        let mut dashboard = Dashboard::new();
        let patch = build_patch(fields(json!({"id": 1, "status": "Won"}))).unwrap();
        assert!(!dashboard.apply_patch(&patch));
    }

    #[test]
    fn won_and_agent_filter_preserves_order() {
        let leads = vec![
            lead(1, "A", "Won", "Brandon"),
            lead(2, "B", "New", "Brandon"),
            lead(3, "C", "Won", "Kelly"),
            lead(4, "D", "Won", "Brandon"),
            lead(5, "E", "Lost", "Brandon"),
            lead(6, "F", "Won", "Brandon"),
            lead(7, "G", "Won", ""),
            lead(8, "H", "Quoted", "Kelly"),
            lead(9, "I", "Won", "Brandon"),
            lead(10, "J", "New", ""),
        ];

        let filter = LeadFilter {
            status: Some("Won".to_string()),
            agent: Some("Brandon".to_string()),
            search: None,
        };
        let matched: Vec<u64> = filter.apply(&leads).iter().map(|l| l.id).collect();
        assert_eq!(matched, vec![1, 4, 6, 9]);
    }

    #[test]
    fn search_matches_name_and_vehicle() {
        let mut subject = lead(1, "Jane Doe", "Won", "Kelly");
        subject.vehicles = "2019 Honda Civic".to_string();
        let leads = vec![subject, lead(2, "Bob", "Won", "Kelly")];

        let filter = LeadFilter {
            search: Some("civic".to_string()),
            ..LeadFilter::won()
        };
        assert_eq!(filter.apply(&leads).len(), 1);

        let filter = LeadFilter {
            search: Some("  ".to_string()),
            ..LeadFilter::won()
        };
        assert_eq!(filter.apply(&leads).len(), 2);
    }

    #[test]
    fn notes_stay_with_their_lead() {
        let mut dashboard = Dashboard::new();
        let note = dashboard.add_note(3, "left voicemail".to_string(), "Lewis".to_string());
        assert_eq!(note.agent, "Lewis");
        assert_eq!(dashboard.notes(3).len(), 1);
        assert!(dashboard.notes(4).is_empty());
    }
}
