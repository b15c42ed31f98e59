//! JSON export of registered declarations for external tooling.

use super::StepRegistry;
use serde::Serialize;

#[derive(Serialize)]
struct DumpedDeclaration<'a> {
    keyword: &'static str,
    pattern: &'a str,
    handler: &'a str,
    owner: &'static str,
    kind: &'static str,
    params: Vec<DumpedParam>,
}

#[derive(Serialize)]
struct DumpedParam {
    kind: &'static str,
    type_name: &'static str,
}

#[derive(Serialize)]
struct DumpedRegistry<'a> {
    owner: &'static str,
    declarations: Vec<DumpedDeclaration<'a>>,
}

impl<W> StepRegistry<W> {
    /// Serialize every declaration, in registration order, as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn dump(&self) -> serde_json::Result<String> {
        let declarations = self
            .handlers
            .iter()
            .flat_map(|handler| {
                handler
                    .declarations
                    .iter()
                    .map(move |declaration| DumpedDeclaration {
                        keyword: declaration.keyword.as_str(),
                        pattern: declaration.pattern.as_str(),
                        handler: &handler.name,
                        owner: handler.owner,
                        kind: handler.kind.as_str(),
                        params: handler
                            .params
                            .iter()
                            .map(|spec| DumpedParam {
                                kind: spec.kind().as_str(),
                                type_name: spec.type_name(),
                            })
                            .collect(),
                    })
            })
            .collect();
        serde_json::to_string_pretty(&DumpedRegistry {
            owner: self.owner,
            declarations,
        })
    }
}
