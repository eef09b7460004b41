use patrol_core::model::Ledger;

pub const PLACEHOLDER_LABEL: &str = "選択してください";
pub const EMPTY_LEDGER_LABEL: &str = "台帳データが利用できません";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeOptionVm {
    pub value: String,
    pub label: String,
}

/// Options and enablement for the attribute picker on the start form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeSelectVm {
    pub options: Vec<AttributeOptionVm>,
    pub select_disabled: bool,
    pub submit_disabled: bool,
}

#[must_use]
pub fn map_attribute_select(ledger: &Ledger) -> AttributeSelectVm {
    if ledger.is_empty() {
        return AttributeSelectVm {
            options: vec![AttributeOptionVm {
                value: String::new(),
                label: EMPTY_LEDGER_LABEL.to_owned(),
            }],
            select_disabled: true,
            submit_disabled: true,
        };
    }

    let placeholder = AttributeOptionVm {
        value: String::new(),
        label: PLACEHOLDER_LABEL.to_owned(),
    };
    let options = std::iter::once(placeholder)
        .chain(ledger.attributes.iter().map(|attribute| AttributeOptionVm {
            value: attribute.id.clone(),
            label: attribute.label.clone(),
        }))
        .collect();

    AttributeSelectVm {
        options,
        select_disabled: false,
        submit_disabled: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patrol_core::model::Attribute;

    fn attribute(id: &str, label: &str) -> Attribute {
        Attribute {
            id: id.into(),
            label: label.into(),
            items: Vec::new(),
        }
    }

    #[test]
    fn empty_ledger_disables_the_form() {
        let vm = map_attribute_select(&Ledger::empty());
        assert!(vm.select_disabled);
        assert!(vm.submit_disabled);
        assert_eq!(vm.options.len(), 1);
        assert_eq!(vm.options[0].label, EMPTY_LEDGER_LABEL);
        assert_eq!(vm.options[0].value, "");
    }

    #[test]
    fn placeholder_then_attributes_in_ledger_order() {
        let ledger = Ledger {
            attributes: vec![attribute("line-b", "ラインB"), attribute("line-a", "ラインA")],
        };
        let vm = map_attribute_select(&ledger);

        assert!(!vm.select_disabled);
        assert!(!vm.submit_disabled);
        let labels: Vec<_> = vm.options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, [PLACEHOLDER_LABEL, "ラインB", "ラインA"]);
        assert_eq!(vm.options[0].value, "");
        assert_eq!(vm.options[1].value, "line-b");
    }
}
