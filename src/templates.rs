//! Built-in starter diagrams.
//!
//! One template per diagram family the editor advertises. Picking a
//! template replaces the whole buffer.

/// A named starter diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub source: &'static str,
}

impl Template {
    /// Look a template up by name, ignoring case and surrounding whitespace.
    pub fn find(name: &str) -> Option<&'static Self> {
        let needle = name.trim();
        TEMPLATES
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(needle))
    }

    /// First line of the source, used as a one-line hint in the picker.
    pub fn header(&self) -> &'static str {
        self.source.lines().next().unwrap_or_default().trim()
    }
}

/// Source loaded into the editor on startup.
pub fn default_source() -> &'static str {
    TEMPLATES[0].source
}

pub static TEMPLATES: [Template; 6] = [
    Template {
        name: "Flowchart",
        source: "graph TD
    A[Start] --> B{Logged in?}
    B -->|Yes| C[Show dashboard]
    B -->|No| D[Show login page]
    D --> E[Enter credentials]
    E --> F{Valid?}
    F -->|Yes| C
    F -->|No| G[Show error]
    G --> D
    C --> H[End]",
    },
    Template {
        name: "Sequence",
        source: "sequenceDiagram
    participant U as User
    participant F as Frontend
    participant B as Backend
    participant D as Database

    U->>F: Open page
    F->>B: Request data
    B->>D: Run query
    D-->>B: Return rows
    B-->>F: Respond with JSON
    F-->>U: Render page",
    },
    Template {
        name: "Class",
        source: "classDiagram
    class User {
        +String name
        +String email
        +login()
        +logout()
    }
    class Admin {
        +String permissions
        +manageUsers()
    }
    class Product {
        +String name
        +Float price
        +updatePrice()
    }
    User <|-- Admin
    User --> Product : browses",
    },
    Template {
        name: "Gantt",
        source: "gantt
    title Project plan
    dateFormat YYYY-MM-DD
    section Design
    Requirements     :done, des1, 2024-01-01, 2024-01-07
    UI design        :active, des2, 2024-01-08, 3d
    section Development
    Frontend         :dev1, after des2, 5d
    Backend          :dev2, after des2, 7d
    section Testing
    Integration test :test1, after dev1, 3d",
    },
    Template {
        name: "Pie",
        source: "pie title Device distribution
    \"Desktop\" : 45
    \"Mobile\" : 35
    \"Tablet\" : 15
    \"Other\" : 5",
    },
    Template {
        name: "State",
        source: "stateDiagram-v2
    [*] --> NotLoggedIn
    NotLoggedIn --> LoggingIn : enter credentials
    LoggingIn --> LoggedIn : success
    LoggingIn --> NotLoggedIn : failure
    LoggedIn --> Shopping : browse products
    Shopping --> Cart : add item
    Cart --> Checkout : check out
    Checkout --> LoggedIn : order placed
    LoggedIn --> [*] : log out",
    },
];
