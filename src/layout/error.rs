use serde::Serialize;

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Structural problems with the input graph. Layout is not attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("duplicate node id `{id}`")]
    DuplicateNode { id: String },

    #[error("edge #{edge} ({from} -> {to}) references unknown node `{missing}`")]
    UnknownNode {
        edge: usize,
        from: String,
        to: String,
        missing: String,
    },
}

/// Conditions that degrade the layout without aborting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayoutWarning {
    /// Level relaxation hit its dequeue bound; `unsettled` nodes keep their
    /// last computed level.
    #[serde(rename_all = "camelCase")]
    LevelsUnconverged {
        dequeues: usize,
        unsettled: Vec<String>,
    },
}

impl std::fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutWarning::LevelsUnconverged {
                dequeues,
                unsettled,
            } => write!(
                f,
                "layout may be incomplete: level assignment stopped after {dequeues} steps \
                 with {} unsettled node(s)",
                unsettled.len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_node_message_names_the_edge() {
        let err = LayoutError::UnknownNode {
            edge: 3,
            from: "A".to_string(),
            to: "Z".to_string(),
            missing: "Z".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "edge #3 (A -> Z) references unknown node `Z`"
        );
    }

    #[test]
    fn warning_serializes_with_kind_tag() {
        let warning = LayoutWarning::LevelsUnconverged {
            dequeues: 4,
            unsettled: vec!["A".to_string()],
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "levelsUnconverged");
        assert_eq!(json["dequeues"], 4);
    }
}
