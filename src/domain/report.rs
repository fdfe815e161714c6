//! Markdown checklist of the test cases stored in a tracker folder.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub id: String,
    pub name: String,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListReport {
    pub name: String,
    pub tasks: Vec<TaskEntry>,
}

#[derive(Debug)]
struct Group<'a> {
    id: &'a str,
    name: Option<&'a str>,
    subtasks: Vec<&'a str>,
}

/// Groups subtasks under their parents, keeping first-seen order.
pub fn render_checklist(title: &str, lists: &[ListReport]) -> String {
    let mut out = format!("# {title}\n");
    for list in lists {
        out.push_str(&format!("\n## {}\n", list.name));
        for group in group_tasks(&list.tasks) {
            if let Some(name) = group.name {
                out.push_str(&format!("- [ ] **{name}**\n"));
            }
            for sub in group.subtasks {
                out.push_str(&format!("  - [ ] {sub}\n"));
            }
        }
    }
    out
}

fn group_tasks(tasks: &[TaskEntry]) -> Vec<Group<'_>> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    for task in tasks {
        let owner = task.parent.as_deref().unwrap_or(task.id.as_str());
        let index = match groups.iter().position(|group| group.id == owner) {
            Some(index) => index,
            None => {
                groups.push(Group {
                    id: owner,
                    name: None,
                    subtasks: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[index];
        if task.parent.is_some() {
            group.subtasks.push(task.name.as_str());
        } else {
            group.name = Some(task.name.as_str());
        }
    }
    groups
}
