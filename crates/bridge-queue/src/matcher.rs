use std::collections::HashSet;

use bridge_types::{JobAssignment, NodeGroupInventory, QueueStatus};

/// Pass 1 (§4.7): drops every queue whose running count already covers its
/// backlog.
pub fn groom_queues(queues: Vec<QueueStatus>) -> Vec<QueueStatus> {
    queues.into_iter().filter(|q| !q.is_fully_covered()).collect()
}

/// Pass 2 (§4.7): assigns each remaining queue the cheapest compatible,
/// not-yet-used node group. Mutates `assigned_group` on the matched queues
/// and returns one [`JobAssignment`] per successful match, in queue order.
pub fn select_node_groups(queues: &mut [QueueStatus], inventory: &NodeGroupInventory) -> Vec<JobAssignment> {
    let mut used_groups: HashSet<String> = HashSet::new();
    let mut assignments = Vec::new();

    for queue in queues.iter_mut() {
        let mut candidates: Vec<(String, String, f64)> = Vec::new();

        for priced in &queue.acceptable_instance_types {
            let mut offering: Vec<&String> = inventory
                .iter()
                .filter(|(name, types)| !used_groups.contains(*name) && types.contains(&priced.instance_type))
                .map(|(name, _)| name)
                .collect();
            offering.sort();

            if let Some(group) = offering.into_iter().next() {
                candidates.push((group.clone(), priced.instance_type.clone(), priced.price_per_hour));
            }
        }

        let Some((group, instance_type, price)) = cheapest(candidates) else {
            continue;
        };

        used_groups.insert(group.clone());
        queue.assigned_group = Some(group.clone());
        assignments.push(JobAssignment {
            queue: queue.name.clone(),
            node_group: group,
            instance_type,
            price_per_hour: price,
        });
    }

    assignments
}

/// Picks the cheapest candidate; ties broken by lexicographically smallest
/// group name (§4.7 tie-break).
fn cheapest(mut candidates: Vec<(String, String, f64)>) -> Option<(String, String, f64)> {
    candidates.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_types::{PricedInstanceType, ResourceRequirement};
    use std::collections::{HashMap, HashSet as StdHashSet};

    fn queue(name: &str, ready: u64, in_flight: u64, running: u64, types: &[(&str, f64)]) -> QueueStatus {
        QueueStatus {
            name: name.to_string(),
            ready,
            in_flight,
            running,
            resource: Some(ResourceRequirement::default()),
            acceptable_instance_types: types
                .iter()
                .map(|(t, p)| PricedInstanceType {
                    instance_type: t.to_string(),
                    price_per_hour: *p,
                })
                .collect(),
            assigned_group: None,
            known_jobs: StdHashSet::new(),
        }
    }

    #[test]
    fn groom_drops_fully_covered_queues() {
        let queues = vec![queue("covered", 2, 0, 2, &[]), queue("needy", 5, 0, 0, &[])];
        let remaining = groom_queues(queues);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "needy");
    }

    #[test]
    fn assigns_the_cheapest_compatible_group() {
        let mut queues = vec![queue("needy", 5, 0, 0, &[("small", 0.10), ("large", 0.50)])];
        let mut inventory = NodeGroupInventory::new();
        inventory.insert("group-a".to_string(), vec!["large".to_string()]);
        inventory.insert("group-b".to_string(), vec!["small".to_string()]);

        let assignments = select_node_groups(&mut queues, &inventory);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].node_group, "group-b");
        assert_eq!(assignments[0].instance_type, "small");
        assert_eq!(queues[0].assigned_group.as_deref(), Some("group-b"));
    }

    #[test]
    fn price_tie_is_broken_lexicographically() {
        let mut queues = vec![queue("needy", 5, 0, 0, &[("small", 0.10)])];
        let mut inventory = NodeGroupInventory::new();
        inventory.insert("group-z".to_string(), vec!["small".to_string()]);
        inventory.insert("group-a".to_string(), vec!["small".to_string()]);

        let assignments = select_node_groups(&mut queues, &inventory);
        assert_eq!(assignments[0].node_group, "group-a");
    }

    #[test]
    fn a_full_pass_grooms_then_assigns_only_the_surviving_queue() {
        let queues = vec![queue("covered", 2, 0, 2, &[("small", 0.10)]), queue("needy", 5, 0, 0, &[("small", 0.10)])];
        let mut remaining = groom_queues(queues);
        let mut inventory = NodeGroupInventory::new();
        inventory.insert("group-a".to_string(), vec!["small".to_string()]);

        let assignments = select_node_groups(&mut remaining, &inventory);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].queue, "needy");
    }

    #[test]
    fn already_used_groups_are_skipped_for_later_queues() {
        let mut queues = vec![
            queue("first", 5, 0, 0, &[("small", 0.10)]),
            queue("second", 5, 0, 0, &[("small", 0.10)]),
        ];
        let mut inventory = HashMap::new();
        inventory.insert("only-group".to_string(), vec!["small".to_string()]);

        let assignments = select_node_groups(&mut queues, &inventory);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].queue, "first");
        assert!(queues[1].assigned_group.is_none());
    }
}
