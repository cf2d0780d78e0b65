//! 父分区 → 子分区的级联选项，全部在内存中计算。

use crate::AreaParent;

pub const PARENT_PLACEHOLDER: &str = "-- 请选择父分区 --";
pub const CHILD_PLACEHOLDER: &str = "-- 请选择子分区 --";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaOption {
    pub id: i64,
    /// `name(id)`
    pub label: String,
}

impl AreaOption {
    fn new(id: i64, name: &str) -> Self {
        Self { id, label: format!("{}({})", name, id) }
    }
}

/// 下拉框内容：固定的占位项加上可选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choices {
    pub placeholder: &'static str,
    pub options: Vec<AreaOption>,
}

impl Choices {
    pub fn empty(placeholder: &'static str) -> Self {
        Self { placeholder, options: Vec::new() }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.options.iter().any(|o| o.id == id)
    }

    pub fn label_of(&self, id: Option<i64>) -> &str {
        id.and_then(|id| self.options.iter().find(|o| o.id == id))
            .map(|o| o.label.as_str())
            .unwrap_or(self.placeholder)
    }
}

/// 只列出含有子分区的父分区
pub fn parent_choices(areas: &[AreaParent]) -> Choices {
    Choices {
        placeholder: PARENT_PLACEHOLDER,
        options: areas
            .iter()
            .filter(|p| !p.children.is_empty())
            .map(|p| AreaOption::new(p.id, &p.name))
            .collect(),
    }
}

pub fn child_choices(areas: &[AreaParent], parent_id: Option<i64>) -> Choices {
    let Some(parent) = parent_id.and_then(|id| areas.iter().find(|p| p.id == id)) else {
        return Choices::empty(CHILD_PLACEHOLDER);
    };
    Choices {
        placeholder: CHILD_PLACEHOLDER,
        options: parent.children.iter().map(|c| AreaOption::new(c.id, &c.name)).collect(),
    }
}
