//! Bundled TypeScript sources for demos and tests.

/// A named TypeScript source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Short identifier used on the command line.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// The TypeScript text.
    pub source: &'static str,
}

/// Four interfaces with getters, unions and self references.
pub const TASK_MANAGEMENT: Sample = Sample {
    name: "task-management",
    description: "Notes, tasks, schedules and sessions",
    source: r#"interface Node {
  id: string;
  path: string;
  source: string;
  get meta(): Record<string, unknown>;
  get title(): string;
  get links(): Node[];
  get backlinks(): Node[];
  get tasks(): Task[];
};

interface Task {
  title: string;
  children: Task[];
  status: "default" | "active" | "done" | "cancelled";
  schedule: TaskSchedule;
  sessions: TaskSession[];
  get isInProgress(): boolean;
}

interface TaskSchedule {
  start: Date;
  end: Date;
  get duration(): number;
  get isCurrent(): boolean;
}

interface TaskSession {
  start: Date;
  end?: Date;
  get duration(): number;
  get isCurrent(): boolean;
}"#,
};

/// Exported client-record interfaces.
pub const API_CLIENTS: Sample = Sample {
    name: "api-clients",
    description: "Client records of a booking API",
    source: include_str!("../samples/api-clients.ts"),
};

/// Exported venue-record interfaces.
pub const API_VENUES: Sample = Sample {
    name: "api-venues",
    description: "Venue records of a booking API",
    source: include_str!("../samples/api-venues.ts"),
};

/// Every bundled sample.
pub const ALL: &[Sample] = &[TASK_MANAGEMENT, API_CLIENTS, API_VENUES];

/// Looks up a bundled sample by name.
#[must_use]
pub fn find(name: &str) -> Option<&'static Sample> {
    ALL.iter().find(|sample| sample.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelParser;
    use tg_core::{FieldShape, FunctionReturn, ModelRef, TypeRef, find_model};

    #[test]
    fn test_find() {
        assert_eq!(find("api-venues"), Some(&API_VENUES));
        assert_eq!(find("missing"), None);
    }

    #[test]
    fn test_names_are_unique() {
        for (i, sample) in ALL.iter().enumerate() {
            assert!(ALL[i + 1..].iter().all(|other| other.name != sample.name));
        }
    }

    #[test]
    fn test_task_management_models() {
        let models = ModelParser::new(TASK_MANAGEMENT.source)
            .expect("ModelParser creation failed")
            .get_models();
        let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["Node", "Task", "TaskSchedule", "TaskSession"]);

        let node = find_model(&models, "Node").expect("Node");
        assert_eq!(node.dependencies, ["Node", "Task"]);
        assert_eq!(
            node.field("links").map(|f| &f.shape),
            Some(&FieldShape::Function {
                arguments: Vec::new(),
                return_type: FunctionReturn::ModelArray([ModelRef::new("Node")]),
            })
        );

        let task = find_model(&models, "Task").expect("Task");
        assert_eq!(task.dependencies, ["Task", "TaskSchedule", "TaskSession"]);
        assert_eq!(task.dependants, ["Node", "Task"]);
        assert_eq!(
            task.field("sessions").map(|f| &f.shape),
            Some(&FieldShape::array(TypeRef::model("TaskSession")))
        );

        let session = find_model(&models, "TaskSession").expect("TaskSession");
        assert!(session.field("end").is_some_and(|f| f.optional));
        assert_eq!(session.dependants, ["Task"]);
    }

    #[test]
    fn test_bundled_api_samples_parse_cleanly() {
        for sample in [API_CLIENTS, API_VENUES] {
            let parser = ModelParser::new(sample.source).expect("ModelParser creation failed");
            assert!(!parser.parser().has_syntax_errors(), "{}", sample.name);
            assert!(!parser.get_models().is_empty(), "{}", sample.name);
        }
    }
}
