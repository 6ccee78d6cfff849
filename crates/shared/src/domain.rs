/// Top-level screen selector. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stage {
    #[default]
    Initial,
    Upload,
    About,
    Results,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Initial => "Home",
            Stage::Upload => "Upload",
            Stage::About => "About",
            Stage::Results => "Results",
        }
    }
}

/// Secondary display selector, only meaningful while the results stage is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    #[default]
    Cards,
    Table,
    Chart,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Cards, ViewMode::Table, ViewMode::Chart];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Cards => "Cards View",
            ViewMode::Table => "Table View",
            ViewMode::Chart => "Chart View",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamMember {
    pub name: &'static str,
    pub role: &'static str,
    pub description: &'static str,
}

pub const TEAM_MEMBERS: &[TeamMember] = &[
    TeamMember {
        name: "Sougata Roy",
        role: "25MCSA05",
        description: "Student",
    },
    TeamMember {
        name: "Krishna Mohanty",
        role: "25MCSA06",
        description: "Student",
    },
    TeamMember {
        name: "Harshit Singh",
        role: "25MCSA07",
        description: "Student",
    },
    TeamMember {
        name: "Souvik Sarkar",
        role: "25MCSA09",
        description: "Student",
    },
];
