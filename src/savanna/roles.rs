/// Hadoop process roles a node template can combine
use std::fmt;
use std::str::FromStr;

use crate::error::SavannaError;

/// A single Hadoop process role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    JobTracker,
    NameNode,
    TaskTracker,
    DataNode,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::JobTracker,
        Role::NameNode,
        Role::TaskTracker,
        Role::DataNode,
    ];

    /// Short tag used in node type names, e.g. "JT"
    pub fn tag(self) -> &'static str {
        match self {
            Role::JobTracker => "JT",
            Role::NameNode => "NN",
            Role::TaskTracker => "TT",
            Role::DataNode => "DN",
        }
    }

    /// Key of this role's option block in a node template body
    pub fn options_key(self) -> &'static str {
        match self {
            Role::JobTracker => "job_tracker",
            Role::NameNode => "name_node",
            Role::TaskTracker => "task_tracker",
            Role::DataNode => "data_node",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Role::JobTracker => 1,
            Role::NameNode => 1 << 1,
            Role::TaskTracker => 1 << 2,
            Role::DataNode => 1 << 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Set of roles parsed from a node type tag such as "JT+NN"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NodeRoles(u8);

impl NodeRoles {
    pub fn empty() -> Self {
        NodeRoles(0)
    }

    pub fn with(self, role: Role) -> Self {
        NodeRoles(self.0 | role.bit())
    }

    pub fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |r| self.contains(*r))
    }
}

impl FromStr for NodeRoles {
    type Err = SavannaError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let mut roles = NodeRoles::empty();
        for token in tag.split('+') {
            let role = match token.trim().to_ascii_lowercase().as_str() {
                "jt" => Role::JobTracker,
                "nn" => Role::NameNode,
                "tt" => Role::TaskTracker,
                "dn" => Role::DataNode,
                _ => return Err(SavannaError::InvalidNodeType(tag.to_string())),
            };
            roles = roles.with(role);
        }
        Ok(roles)
    }
}

impl fmt::Display for NodeRoles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.iter().map(Role::tag).collect();
        f.write_str(&tags.join("+"))
    }
}
