//! Template files materialized into a project.
//!
//! Templates are embedded in the binary. Placeholders are spelled
//! `{{name}}` and replaced verbatim; unknown placeholders are left alone.

use std::collections::BTreeMap;

use crate::core::tree::Tree;
use crate::util::fs::join_path_fragments;

/// A template file: path relative to the target directory plus its contents.
#[derive(Debug, Clone, Copy)]
pub struct TemplateFile {
    pub path: &'static str,
    pub contents: &'static str,
}

/// Placeholder values for a template run.
pub type Substitutions = BTreeMap<String, String>;

/// Replace every `{{key}}` in `text` with its substitution.
pub fn render(text: &str, substitutions: &Substitutions) -> String {
    substitutions
        .iter()
        .fold(text.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{{{}}}}}", key), value)
        })
}

/// Render `templates` and stage them under `target_dir`.
///
/// Existing files are overwritten. Returns the staged workspace paths.
pub fn generate_files(
    tree: &mut Tree,
    templates: &[TemplateFile],
    target_dir: &str,
    substitutions: &Substitutions,
) -> Vec<String> {
    templates
        .iter()
        .map(|template| {
            let path = join_path_fragments(&[target_dir, &render(template.path, substitutions)]);
            tree.write(&path, render(template.contents, substitutions));
            tracing::debug!("generated {}", path);
            path
        })
        .collect()
}

/// Files generated for a component-test setup.
pub const COMPONENT_PROJECT_TEMPLATES: &[TemplateFile] = &[
    TemplateFile {
        path: "cypress.config.ts",
        contents: CYPRESS_CONFIG,
    },
    TemplateFile {
        path: "tsconfig.cy.json",
        contents: TSCONFIG_CY,
    },
    TemplateFile {
        path: "cypress/support/component.ts",
        contents: SUPPORT_COMPONENT,
    },
    TemplateFile {
        path: "cypress/support/commands.ts",
        contents: SUPPORT_COMMANDS,
    },
    TemplateFile {
        path: "cypress/support/component-index.html",
        contents: COMPONENT_INDEX_HTML,
    },
    TemplateFile {
        path: "cypress/fixtures/example.json",
        contents: EXAMPLE_FIXTURE,
    },
];

const CYPRESS_CONFIG: &str = r#"import { defineConfig } from 'cypress';
import { componentDevServer } from '@nrwl/cypress/plugins/next';

export default defineConfig({
  component: {
    devServer: componentDevServer('tsconfig.cy.json', '{{compiler}}'),
    supportFile: 'cypress/support/component.ts',
    indexHtmlFile: 'cypress/support/component-index.html',
    specPattern: 'src/**/*.cy.{js,jsx,ts,tsx}',
  },
});
"#;

const TSCONFIG_CY: &str = r#"{
  "extends": "./tsconfig.json",
  "compilerOptions": {
    "outDir": "{{offsetFromRoot}}dist/out-tsc",
    "types": ["cypress", "node"]
  },
  "include": [
    "cypress/**/*.ts",
    "cypress/**/*.tsx",
    "cypress/**/*.js",
    "src/**/*.cy.ts",
    "src/**/*.cy.tsx",
    "src/**/*.cy.js",
    "src/**/*.cy.jsx",
    "src/**/*.d.ts"
  ]
}
"#;

const SUPPORT_COMPONENT: &str = r#"// ***********************************************************
// This file is processed and loaded automatically before the
// component test files of {{project}}.
// ***********************************************************

import './commands';
{{mountCommand}}"#;

const SUPPORT_COMMANDS: &str = r#"/// <reference types="cypress" />

// Custom commands for {{project}} component tests, e.g.
//
// Cypress.Commands.add('login', (email, password) => { ... })

export {};
"#;

const COMPONENT_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta http-equiv="X-UA-Compatible" content="IE=edge">
    <meta name="viewport" content="width=device-width,initial-scale=1.0">
    <title>{{project}} Components App</title>
  </head>
  <body>
    <div data-cy-root></div>
  </body>
</html>
"#;

const EXAMPLE_FIXTURE: &str = r#"{
  "name": "Using fixtures to represent data",
  "email": "hello@cypress.io"
}
"#;

/// `mount` registration for component types backed by `@cypress/react`.
pub const REACT_MOUNT_COMMAND: &str = r#"
import { mount } from 'cypress/react';

declare global {
  // eslint-disable-next-line @typescript-eslint/no-namespace
  namespace Cypress {
    interface Chainable<Subject> {
      mount: typeof mount;
    }
  }
}

Cypress.Commands.add('mount', mount);
"#;
