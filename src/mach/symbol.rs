use super::function::BasicFunction;
use super::keyword::Keyword;
use super::val::Value;
use crate::error;
use crate::lang::Error;
use std::collections::HashMap;

type Result<T> = std::result::Result<T, Error>;

/// ## Symbol environment
///
/// Name tables for variables, constants, arrays, and functions. Keys are
/// canonicalised to upper-case; keywords are a fixed vocabulary checked
/// through the same surface so the name spaces stay disjoint.

#[derive(Debug, Clone)]
pub struct Constant {
    pub description: String,
    pub value: Value,
}

#[derive(Clone)]
pub struct FunctionEntry {
    pub description: String,
    pub func: BasicFunction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    dimensions: Vec<usize>,
    values: Vec<Value>,
}

impl Array {
    pub fn new(dimensions: Vec<usize>) -> Array {
        let total = dimensions.iter().product();
        Array {
            dimensions,
            values: vec![Value::Empty; total],
        }
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn fetch(&self, indices: &[usize]) -> Result<Value> {
        let offset = self.offset(indices)?;
        Ok(self.values[offset].clone())
    }

    pub fn store(&mut self, indices: &[usize], value: Value) -> Result<()> {
        let offset = self.offset(indices)?;
        self.values[offset] = value;
        Ok(())
    }

    /// Flat position of a cell. Row index varies fastest; each index must
    /// stay below its declared dimension.
    fn offset(&self, indices: &[usize]) -> Result<usize> {
        if self.dimensions.len() != indices.len() {
            return Err(error!(Syntax;
                "Must supply {} indexes to address array",
                self.dimensions.len()
            ));
        }
        let mut offset = 0;
        let mut multiplier = 1;
        for (index, dimension) in indices.iter().zip(&self.dimensions) {
            if index >= dimension {
                return Err(error!(Syntax;
                    "Array out of bounds. Max is ( {} ) you requested ( {} )",
                    join(&self.dimensions),
                    join(indices)
                ));
            }
            offset += index * multiplier;
            multiplier *= dimension;
        }
        Ok(offset)
    }
}

fn join(values: &[usize]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Default)]
pub struct Symbols {
    variables: HashMap<String, Value>,
    arrays: HashMap<String, Array>,
    constants: HashMap<String, Constant>,
    functions: HashMap<String, FunctionEntry>,
}

fn canonical(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

impl Symbols {
    pub fn new() -> Symbols {
        Symbols::default()
    }

    pub fn is_variable(&self, name: &str) -> bool {
        self.variables.contains_key(&canonical(name)) || self.is_constant(name)
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains_key(&canonical(name))
    }

    pub fn is_array(&self, name: &str) -> bool {
        self.arrays.contains_key(&canonical(name))
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains_key(&canonical(name))
    }

    pub fn is_keyword(&self, name: &str) -> bool {
        Keyword::from_name(name.trim()).is_some()
    }

    pub fn add_variable(&mut self, name: &str, value: Value) -> Result<()> {
        if self.is_constant(name) {
            return Err(error!(Syntax; "Cannot create a variable that is a system constant"));
        }
        if self.is_function(name) || self.is_keyword(name) {
            return Err(error!(Syntax;
                "Cannot create a variable with the same name as a system function/keyword"
            ));
        }
        self.variables.insert(canonical(name), value);
        Ok(())
    }

    pub fn remove_variable(&mut self, name: &str) -> Result<()> {
        match self.variables.remove(&canonical(name)) {
            Some(_) => Ok(()),
            None => Err(error!(Syntax; "Attempt to delete unknown variable")),
        }
    }

    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    pub fn add_constant(&mut self, name: &str, description: &str, value: Value) -> Result<()> {
        if self.is_function(name) || self.is_keyword(name) {
            return Err(error!(Syntax;
                "Cannot create a constant with the same name as a system function/keyword"
            ));
        }
        let key = canonical(name);
        self.variables.remove(&key);
        self.constants.insert(
            key,
            Constant {
                description: description.to_string(),
                value,
            },
        );
        Ok(())
    }

    pub fn add_function(
        &mut self,
        name: &str,
        description: &str,
        func: BasicFunction,
    ) -> Result<()> {
        if self.is_keyword(name) {
            return Err(error!(Fatal;
                "Cannot create a function with the same name as a system keyword"
            ));
        }
        self.functions.insert(
            canonical(name),
            FunctionEntry {
                description: description.to_string(),
                func,
            },
        );
        Ok(())
    }

    pub fn function(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(&canonical(name))
    }

    pub fn fetch_variable_constant(&self, name: &str) -> Result<Value> {
        let key = canonical(name);
        if let Some(constant) = self.constants.get(&key) {
            return Ok(constant.value.clone());
        }
        if let Some(value) = self.variables.get(&key) {
            return Ok(value.clone());
        }
        Err(error!(Fatal; "Undefined variable or constant '{}'", key))
    }

    pub fn store_variable(&mut self, name: &str, value: Value) -> Result<()> {
        self.add_variable(name, value)
    }

    pub fn dim_array(&mut self, name: &str, dimensions: Vec<usize>) -> Result<()> {
        if self.is_keyword(name) || self.is_function(name) || self.is_constant(name) {
            return Err(error!(Syntax;
                "Cannot create an array with the same name as a keyword or function"
            ));
        }
        let key = canonical(name);
        if self.arrays.contains_key(&key) {
            return Err(error!(Syntax; "Attempt to Re-DIM an existing array"));
        }
        self.variables.remove(&key);
        self.arrays.insert(key, Array::new(dimensions));
        Ok(())
    }

    pub fn array_fetch(&self, name: &str, indices: &[usize]) -> Result<Value> {
        match self.arrays.get(&canonical(name)) {
            Some(array) => array.fetch(indices),
            None => Err(error!(Syntax; "Unknown array '{}'", canonical(name))),
        }
    }

    pub fn array_store(&mut self, name: &str, indices: &[usize], value: Value) -> Result<()> {
        match self.arrays.get_mut(&canonical(name)) {
            Some(array) => array.store(indices, value),
            None => Err(error!(Syntax; "Unknown array '{}'", canonical(name))),
        }
    }

    pub fn list_variables(&self) -> String {
        let mut out = String::new();
        for name in sorted_keys(&self.variables) {
            let value = &self.variables[name];
            out.push_str(&format!("{}: {} = {}\n", name, value.kind(), value));
        }
        for name in sorted_keys(&self.arrays) {
            let array = &self.arrays[name];
            out.push_str(&format!("{}( {} )\n", name, join(array.dimensions())));
        }
        out
    }

    pub fn list_constants(&self) -> String {
        let mut out = String::new();
        for name in sorted_keys(&self.constants) {
            let constant = &self.constants[name];
            out.push_str(&format!(
                "{}: {} = {}: {}\n",
                name,
                constant.value.kind(),
                constant.value,
                constant.description
            ));
        }
        out
    }

    pub fn list_functions(&self) -> String {
        let mut out = String::new();
        for name in sorted_keys(&self.functions) {
            out.push_str(&format!("{}: {}\n", name, self.functions[name].description));
        }
        out
    }

    pub fn list_keywords(&self) -> String {
        let mut names: Vec<_> = Keyword::all().iter().map(|k| k.name()).collect();
        names.sort_unstable();
        let mut out = String::new();
        for name in names {
            out.push_str(name);
            out.push('\n');
        }
        out
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&String> {
    let mut keys: Vec<_> = map.keys().collect();
    keys.sort_unstable();
    keys
}
