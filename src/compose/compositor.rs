#![forbid(unsafe_code)]

//! Placement buckets and override/accumulate merging

use crate::compose::fragment::render_fragment;
use crate::types::{CompositionBehavior, Placement};
use crate::validator::ResolvedDirective;
use serde::Serialize;

/// Separator between the buckets and the clean text
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// A rendered fragment and the directive it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub decorator: String,
    pub text: String,
    pub placement: Placement,
    pub composition: CompositionBehavior,
}

impl Fragment {
    pub fn render(directive: &ResolvedDirective) -> Self {
        let template = &directive.record.template;
        Self {
            decorator: directive.name().to_string(),
            text: render_fragment(directive),
            placement: template.placement,
            composition: template.composition,
        }
    }
}

/// One placement bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Bucket {
    fragments: Vec<Fragment>,
    /// Decorators whose fragments were discarded by a later override
    discarded: Vec<String>,
}

impl Bucket {
    fn push(&mut self, fragment: Fragment) {
        if fragment.composition == CompositionBehavior::Override {
            self.discarded
                .extend(self.fragments.drain(..).map(|f| f.decorator));
        }
        self.fragments.push(fragment);
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn discarded(&self) -> &[String] {
        &self.discarded
    }

    /// Bucket content: non-empty fragments joined with single spaces
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of composing directives around a clean text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Composition {
    pub text: String,
    pub prepend: Bucket,
    pub append: Bucket,
}

/// Merges rendered fragments in invocation order
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    prepend: Bucket,
    append: Bucket,
    directives: usize,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one directive; order of calls is the composition order
    pub fn push(&mut self, directive: &ResolvedDirective) {
        self.push_fragment(Fragment::render(directive));
    }

    pub fn push_fragment(&mut self, fragment: Fragment) {
        self.directives += 1;
        match fragment.placement {
            Placement::Prepend => self.prepend.push(fragment),
            Placement::Append => self.append.push(fragment),
        }
    }

    /// Produce the final text around `body`
    ///
    /// With no directives `body` is returned unchanged. Otherwise the result
    /// is the prepend bucket, a blank line, the body, then a blank line and
    /// the append bucket; empty parts and their separators are left out.
    pub fn finish(self, body: &str) -> Composition {
        let text = if self.directives == 0 {
            body.to_string()
        } else {
            let prepend = self.prepend.text();
            let append = self.append.text();
            let body = if append.is_empty() {
                body
            } else {
                body.trim_end_matches(['\n', '\r'])
            };

            [prepend.as_str(), body, append.as_str()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(BLOCK_SEPARATOR)
        };

        Composition {
            text,
            prepend: self.prepend,
            append: self.append,
        }
    }
}

/// Compose `directives`, in order, around `body`
pub fn compose(body: &str, directives: &[ResolvedDirective]) -> Composition {
    let mut compositor = Compositor::new();
    for directive in directives {
        compositor.push(directive);
    }
    compositor.finish(body)
}
