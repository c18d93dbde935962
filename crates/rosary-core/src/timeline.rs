//! Timeline builder
//!
//! The timeline is built once at startup and never mutated; an index into
//! it is the only way nodes are addressed.

use rosary_api::{Node, PrayerKind, PrayerNode};
use rosary_config::DEFAULT_LOAD_DURATION_MS;

use crate::liturgy::{
    APOSTLES_CREED_STANZAS, INVITATORY_GLORIA, INVOCATION, INVOCATIONS_PER_SET,
    LORDS_PRAYER_STANZAS, MYSTERIES,
};

/// Immutable node sequence plus its content fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    nodes: Vec<Node>,
    flow_version: String,
}

impl Timeline {
    /// Build the timeline with the given load-node duration
    pub fn build(load_duration_ms: u64) -> Self {
        Self {
            nodes: build_flow_timeline_with(load_duration_ms),
            flow_version: compute_flow_version(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn flow_version(&self) -> &str {
        &self.flow_version
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::build(DEFAULT_LOAD_DURATION_MS)
    }
}

fn stanza_prayer(kind: PrayerKind, title: &str, stanzas: &[&str], meta: String) -> Node {
    Node::Prayer(PrayerNode {
        kind,
        title: title.to_string(),
        text: stanzas.join(" "),
        meta,
        stanzas: stanzas.iter().map(|s| s.to_string()).collect(),
    })
}

/// Prayer nodes in order, without load screens
pub fn build_prayer_sequence() -> Vec<Node> {
    let mut prayers = vec![
        stanza_prayer(
            PrayerKind::Creed,
            "Apostles' Creed",
            &APOSTLES_CREED_STANZAS,
            "Opening".into(),
        ),
        Node::prayer(
            PrayerKind::Invitatory,
            "Invitatory and Gloria",
            INVITATORY_GLORIA,
            "Invitation",
        ),
    ];

    for (set_index, mystery) in MYSTERIES.iter().enumerate() {
        let set = format!("Set {}", set_index + 1);

        prayers.push(stanza_prayer(
            PrayerKind::LordsPrayer,
            "Lord's Prayer",
            &LORDS_PRAYER_STANZAS,
            set.clone(),
        ));
        prayers.push(Node::prayer(
            PrayerKind::Mystery,
            format!("Mystery {}", set_index + 1),
            *mystery,
            set.clone(),
        ));

        for i in 1..=INVOCATIONS_PER_SET {
            prayers.push(Node::prayer(
                PrayerKind::Invocation,
                format!("Invocation {} of {}", i, INVOCATIONS_PER_SET),
                INVOCATION,
                set.clone(),
            ));
        }
    }

    prayers
}

/// Transitions that happen immediately, without a load screen
pub fn should_skip_load_between(current: PrayerKind, next: PrayerKind) -> bool {
    let mystery_to_first_invocation =
        current == PrayerKind::Mystery && next == PrayerKind::Invocation;
    let invocation_to_invocation =
        current == PrayerKind::Invocation && next == PrayerKind::Invocation;

    mystery_to_first_invocation || invocation_to_invocation
}

/// Full timeline with the default load duration
pub fn build_flow_timeline() -> Vec<Node> {
    build_flow_timeline_with(DEFAULT_LOAD_DURATION_MS)
}

/// Full timeline: an opening load, the prayers with load screens between
/// them (except where skipped), and a closing load.
pub fn build_flow_timeline_with(load_duration_ms: u64) -> Vec<Node> {
    // A zero-length load would chain advances within a single tick
    let load_duration_ms = load_duration_ms.max(1);
    let prayers = build_prayer_sequence();
    let mut nodes = vec![Node::load(load_duration_ms)];

    for (index, current) in prayers.iter().enumerate() {
        nodes.push(current.clone());

        let skip = match (current.kind(), prayers.get(index + 1).and_then(Node::kind)) {
            (Some(current), Some(next)) => should_skip_load_between(current, next),
            _ => false,
        };
        if !skip {
            nodes.push(Node::load(load_duration_ms));
        }
    }

    nodes
}

/// Fingerprint of the timeline content, stored with persisted sessions
pub fn compute_flow_version() -> String {
    format!("flow-{}-{}", MYSTERIES.len(), build_prayer_sequence().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_shape() {
        let nodes = build_flow_timeline();
        assert_eq!(build_prayer_sequence().len(), 38);
        assert_eq!(nodes.len(), 49);
        assert!(nodes.first().unwrap().is_load());
        assert!(nodes.last().unwrap().is_load());
        assert_eq!(nodes[1].kind(), Some(PrayerKind::Creed));
        assert_eq!(nodes[3].kind(), Some(PrayerKind::Invitatory));
        assert_eq!(nodes[5].kind(), Some(PrayerKind::LordsPrayer));
        assert_eq!(nodes[7].kind(), Some(PrayerKind::Mystery));
        assert_eq!(nodes[8].kind(), Some(PrayerKind::Invocation));
    }

    #[test]
    fn no_consecutive_loads() {
        let nodes = build_flow_timeline();
        for pair in nodes.windows(2) {
            assert!(!(pair[0].is_load() && pair[1].is_load()));
        }
    }

    #[test]
    fn mystery_flows_straight_into_invocation() {
        let nodes = build_flow_timeline();
        for (i, node) in nodes.iter().enumerate() {
            if node.kind() == Some(PrayerKind::Mystery) {
                assert_eq!(nodes[i + 1].kind(), Some(PrayerKind::Invocation));
            }
        }
    }

    #[test]
    fn invocations_are_contiguous() {
        let nodes = build_flow_timeline();
        let mut run = 0;
        for node in &nodes {
            if node.kind() == Some(PrayerKind::Invocation) {
                run += 1;
            } else {
                assert!(run == 0 || run == INVOCATIONS_PER_SET);
                run = 0;
            }
        }
        let total = nodes
            .iter()
            .filter(|n| n.kind() == Some(PrayerKind::Invocation))
            .count();
        assert_eq!(total, MYSTERIES.len() * INVOCATIONS_PER_SET);
    }

    #[test]
    fn other_prayers_are_separated_by_loads() {
        let nodes = build_flow_timeline();
        for pair in nodes.windows(2) {
            if let (Some(a), Some(b)) = (pair[0].kind(), pair[1].kind()) {
                assert!(should_skip_load_between(a, b), "{a} -> {b} without load");
            }
        }
    }

    #[test]
    fn stanza_prayers_carry_stanzas() {
        let nodes = build_flow_timeline();
        let creed = nodes[1].as_prayer().unwrap();
        assert_eq!(creed.stanzas.len(), 7);
        assert!(creed.text.starts_with("I believe in God"));
        assert!(creed.text.ends_with("Amen."));

        let lords = nodes[5].as_prayer().unwrap();
        assert_eq!(lords.stanzas.len(), 5);
        assert_eq!(lords.meta, "Set 1");
    }

    #[test]
    fn flow_version_fingerprint() {
        assert_eq!(compute_flow_version(), "flow-4-38");
        assert_eq!(Timeline::default().flow_version(), "flow-4-38");
    }

    #[test]
    fn load_duration_is_applied() {
        let timeline = Timeline::build(2_000);
        assert_eq!(timeline.get(0), Some(&Node::load(2_000)));
        assert_eq!(Timeline::build(0).get(0), Some(&Node::load(1)));
    }

    #[test]
    fn build_is_deterministic() {
        assert_eq!(build_flow_timeline(), build_flow_timeline());
    }
}
