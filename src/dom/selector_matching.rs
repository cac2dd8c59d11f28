use super::Dom;
use crate::selector::{
    SelectorAttrCondition, SelectorCombinator, SelectorPart,
    SelectorPseudoClass, SelectorStep, parse_selector_groups,
};
use crate::{NodeId, Result};

impl Dom {
    /// Elements under `node_id` in document order, excluding `node_id` itself.
    pub(crate) fn collect_elements_dfs(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements_descendants_dfs(node_id, &mut out);
        out
    }

    fn collect_elements_descendants_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        for child in self.children(node_id) {
            if self.element(*child).is_some() {
                out.push(*child);
            }
            self.collect_elements_descendants_dfs(*child, out);
        }
    }

    pub(crate) fn child_elements(&self, node_id: NodeId) -> Vec<NodeId> {
        self.children(node_id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
            .collect()
    }

    pub(crate) fn previous_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent = self.parent(node_id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|id| *id == node_id)?;
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .find(|id| self.element(*id).is_some())
    }

    pub(crate) fn next_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent = self.parent(node_id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|id| *id == node_id)?;
        siblings[pos + 1..]
            .iter()
            .copied()
            .find(|id| self.element(*id).is_some())
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.query_selector_all_from(self.root, selector)
    }

    pub(crate) fn query_selector_all_from(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;
        Ok(self
            .collect_elements_dfs(root)
            .into_iter()
            .filter(|node| self.matches_any_group(*node, &groups))
            .collect())
    }

    pub(crate) fn matches_selector(&self, node_id: NodeId, selector: &str) -> Result<bool> {
        let groups = parse_selector_groups(selector)?;
        Ok(self.matches_any_group(node_id, &groups))
    }

    pub(crate) fn matches_any_group(&self, node_id: NodeId, groups: &[Vec<SelectorPart>]) -> bool {
        groups
            .iter()
            .any(|chain| self.matches_selector_chain(node_id, chain))
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub(crate) fn closest(&self, node_id: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let groups = parse_selector_groups(selector)?;
        let mut cursor = Some(node_id);
        while let Some(node) = cursor {
            if self.matches_any_group(node, &groups) {
                return Ok(Some(node));
            }
            cursor = self.parent(node);
        }
        Ok(None)
    }

    /// Right-to-left match with backtracking over descendant and sibling combinators.
    pub(crate) fn matches_selector_chain(&self, node_id: NodeId, chain: &[SelectorPart]) -> bool {
        let Some((last, rest)) = chain.split_last() else {
            return false;
        };
        if !self.matches_step(node_id, &last.step) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        match last.combinator.unwrap_or(SelectorCombinator::Descendant) {
            SelectorCombinator::Child => self
                .parent(node_id)
                .is_some_and(|parent| self.matches_selector_chain(parent, rest)),
            SelectorCombinator::Descendant => {
                let mut cursor = self.parent(node_id);
                while let Some(ancestor) = cursor {
                    if self.matches_selector_chain(ancestor, rest) {
                        return true;
                    }
                    cursor = self.parent(ancestor);
                }
                false
            }
            SelectorCombinator::AdjacentSibling => self
                .previous_element_sibling(node_id)
                .is_some_and(|sibling| self.matches_selector_chain(sibling, rest)),
            SelectorCombinator::GeneralSibling => {
                let mut cursor = self.previous_element_sibling(node_id);
                while let Some(sibling) = cursor {
                    if self.matches_selector_chain(sibling, rest) {
                        return true;
                    }
                    cursor = self.previous_element_sibling(sibling);
                }
                false
            }
        }
    }

    pub(crate) fn matches_step(&self, node_id: NodeId, step: &SelectorStep) -> bool {
        let Some(element) = self.element(node_id) else {
            return false;
        };

        if let Some(tag) = &step.tag {
            if !element.tag_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &step.id {
            if element.attrs.get("id") != Some(id) {
                return false;
            }
        }

        if step
            .classes
            .iter()
            .any(|class_name| !self.has_class(node_id, class_name))
        {
            return false;
        }

        let attr_matched = step.attrs.iter().all(|cond| match cond {
            SelectorAttrCondition::Exists { key } => element.attrs.contains_key(key),
            SelectorAttrCondition::Eq { key, value } => element.attrs.get(key) == Some(value),
            SelectorAttrCondition::StartsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| !value.is_empty() && attr.starts_with(value.as_str())),
            SelectorAttrCondition::EndsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| !value.is_empty() && attr.ends_with(value.as_str())),
            SelectorAttrCondition::Contains { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| !value.is_empty() && attr.contains(value.as_str())),
            SelectorAttrCondition::Includes { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| attr.split_whitespace().any(|token| token == value)),
            SelectorAttrCondition::DashMatch { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| attr == value || attr.starts_with(&format!("{value}-"))),
        });
        if !attr_matched {
            return false;
        }

        step.pseudo_classes
            .iter()
            .all(|pseudo| self.matches_pseudo(node_id, pseudo))
    }

    fn matches_pseudo(&self, node_id: NodeId, pseudo: &SelectorPseudoClass) -> bool {
        match pseudo {
            SelectorPseudoClass::FirstChild => self.previous_element_sibling(node_id).is_none(),
            SelectorPseudoClass::LastChild => self.next_element_sibling(node_id).is_none(),
            SelectorPseudoClass::OnlyChild => {
                self.previous_element_sibling(node_id).is_none()
                    && self.next_element_sibling(node_id).is_none()
            }
            SelectorPseudoClass::FirstOfType => {
                self.type_position(node_id).is_some_and(|(pos, _)| pos == 1)
            }
            SelectorPseudoClass::LastOfType => self
                .type_position(node_id)
                .is_some_and(|(pos, total)| pos == total),
            SelectorPseudoClass::OnlyOfType => self
                .type_position(node_id)
                .is_some_and(|(_, total)| total == 1),
            SelectorPseudoClass::Empty => self.children(node_id).is_empty(),
            SelectorPseudoClass::NthChild(selector) => self
                .element_position(node_id)
                .is_some_and(|(pos, _)| selector.matches(pos)),
            SelectorPseudoClass::NthLastChild(selector) => self
                .element_position(node_id)
                .is_some_and(|(pos, total)| selector.matches(total - pos + 1)),
            SelectorPseudoClass::Not(inners) => !self.matches_any_group(node_id, inners),
            SelectorPseudoClass::Is(inners) | SelectorPseudoClass::Where(inners) => {
                self.matches_any_group(node_id, inners)
            }
            SelectorPseudoClass::Has(inners) => inners
                .iter()
                .any(|inner| self.has_relative_match(node_id, inner)),
        }
    }

    fn has_relative_match(&self, anchor: NodeId, chain: &[SelectorPart]) -> bool {
        self.collect_elements_dfs(self.root)
            .into_iter()
            .any(|node| self.matches_anchored_chain(node, chain, anchor))
    }

    // Like `matches_selector_chain`, but the leading combinator relates the
    // first part to `anchor`.
    fn matches_anchored_chain(&self, node: NodeId, chain: &[SelectorPart], anchor: NodeId) -> bool {
        let Some((last, rest)) = chain.split_last() else {
            return false;
        };
        if !self.matches_step(node, &last.step) {
            return false;
        }
        let combinator = last.combinator.unwrap_or(SelectorCombinator::Descendant);
        if rest.is_empty() {
            return match combinator {
                SelectorCombinator::Descendant => self.is_descendant_of(node, anchor),
                SelectorCombinator::Child => self.parent(node) == Some(anchor),
                SelectorCombinator::AdjacentSibling => {
                    self.previous_element_sibling(node) == Some(anchor)
                }
                SelectorCombinator::GeneralSibling => {
                    self.preceding_element_siblings(node).contains(&anchor)
                }
            };
        }
        let candidates = match combinator {
            SelectorCombinator::Child => self.parent(node).into_iter().collect(),
            SelectorCombinator::Descendant => self.ancestors(node),
            SelectorCombinator::AdjacentSibling => {
                self.previous_element_sibling(node).into_iter().collect()
            }
            SelectorCombinator::GeneralSibling => self.preceding_element_siblings(node),
        };
        candidates
            .into_iter()
            .any(|candidate| self.matches_anchored_chain(candidate, rest, anchor))
    }

    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(node);
        while let Some(ancestor) = cursor {
            out.push(ancestor);
            cursor = self.parent(ancestor);
        }
        out
    }

    fn preceding_element_siblings(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.previous_element_sibling(node);
        while let Some(sibling) = cursor {
            out.push(sibling);
            cursor = self.previous_element_sibling(sibling);
        }
        out
    }

    /// One-based position among element siblings, and their count.
    fn element_position(&self, node_id: NodeId) -> Option<(usize, usize)> {
        let parent = self.parent(node_id)?;
        let siblings = self.child_elements(parent);
        let pos = siblings.iter().position(|id| *id == node_id)?;
        Some((pos + 1, siblings.len()))
    }

    fn type_position(&self, node_id: NodeId) -> Option<(usize, usize)> {
        let parent = self.parent(node_id)?;
        let tag = self.tag_name(node_id)?;
        let siblings = self
            .child_elements(parent)
            .into_iter()
            .filter(|id| self.tag_name(*id) == Some(tag))
            .collect::<Vec<_>>();
        let pos = siblings.iter().position(|id| *id == node_id)?;
        Some((pos + 1, siblings.len()))
    }
}

#[cfg(test)]
mod tests {
    use crate::html::parse_fragment;
    use crate::{Error, Result};

    fn ids(dom: &super::Dom, nodes: &[crate::NodeId]) -> Vec<String> {
        nodes
            .iter()
            .map(|node| dom.attr(*node, "id").unwrap_or_default())
            .collect()
    }

    #[test]
    fn descendant_combinator_backtracks_past_nearer_ancestors() -> Result<()> {
        let dom = parse_fragment(
            "<div class='a'><section><div class='b'><p id='t'>x</p></div></section></div>",
        )?;
        assert_eq!(ids(&dom, &dom.query_selector_all(".a > section p")?), vec!["t"]);
        assert_eq!(ids(&dom, &dom.query_selector_all("div.a div p")?), vec!["t"]);
        assert!(dom.query_selector_all(".b > section p")?.is_empty());
        Ok(())
    }

    #[test]
    fn sibling_and_structural_pseudo_classes() -> Result<()> {
        let dom = parse_fragment(
            "<ul><li id='a'></li><li id='b' class='on'>1</li><li id='c'></li><li id='d'></li></ul>",
        )?;
        assert_eq!(ids(&dom, &dom.query_selector_all(".on + li")?), vec!["c"]);
        assert_eq!(ids(&dom, &dom.query_selector_all(".on ~ li")?), vec!["c", "d"]);
        assert_eq!(ids(&dom, &dom.query_selector_all("li:nth-child(odd)")?), vec!["a", "c"]);
        assert_eq!(ids(&dom, &dom.query_selector_all("li:nth-last-child(1)")?), vec!["d"]);
        assert_eq!(
            ids(&dom, &dom.query_selector_all("li:empty:not(:first-child)")?),
            vec!["c", "d"]
        );
        assert_eq!(ids(&dom, &dom.query_selector_all("li:is(#a, #d)")?), vec!["a", "d"]);
        Ok(())
    }

    #[test]
    fn has_and_closest() -> Result<()> {
        let dom = parse_fragment(
            "<section id='s1'><h2 id='h'>t</h2></section><section id='s2'><div><h2></h2></div></section>",
        )?;
        assert_eq!(ids(&dom, &dom.query_selector_all("section:has(> h2)")?), vec!["s1"]);
        assert_eq!(ids(&dom, &dom.query_selector_all("section:has(h2)")?), vec!["s1", "s2"]);
        let heading = dom.by_id("h").ok_or_else(|| Error::HtmlParse("missing".into()))?;
        let section = dom.closest(heading, "section")?;
        assert_eq!(section.and_then(|node| dom.attr(node, "id")).as_deref(), Some("s1"));
        assert_eq!(dom.closest(heading, "h2")?, Some(heading));
        assert!(dom.matches_selector(heading, "p").is_ok_and(|hit| !hit));
        Ok(())
    }

    #[test]
    fn attribute_operators() -> Result<()> {
        let dom = parse_fragment(
            "<a id='1' href='https://x.io/a.pdf' lang='en-US' rel='nofollow noopener'></a>",
        )?;
        for selector in [
            "[href^='https']",
            "[href$=\".pdf\"]",
            "[href*=x]",
            "[rel~=noopener]",
            "[lang|=en]",
            "a[id='1']",
        ] {
            assert_eq!(dom.query_selector_all(selector)?.len(), 1, "{selector}");
        }
        Ok(())
    }
}
