//! Script bodies for every (category, tier) pair.
//!
//! Each body holds exactly one [`SELECTOR_SLOT`] marker; everything else is
//! emitted as-is.

use super::{ScriptCategory, Tier};

/// Marker replaced by the chosen selector.
pub(crate) const SELECTOR_SLOT: &str = "__SELECTOR__";

/// Template body for `category` at `tier`.
pub(crate) fn body(category: ScriptCategory, tier: Tier) -> &'static str {
    match (category, tier) {
        (ScriptCategory::Cart, Tier::Basic) => CART_BASIC,
        (ScriptCategory::Cart, Tier::Optimized) => CART_OPTIMIZED,
        (ScriptCategory::Cart, Tier::Advanced) => CART_ADVANCED,
        (ScriptCategory::Payment, Tier::Basic) => PAYMENT_BASIC,
        (ScriptCategory::Payment, Tier::Optimized) => PAYMENT_OPTIMIZED,
        (ScriptCategory::Payment, Tier::Advanced) => PAYMENT_ADVANCED,
        (ScriptCategory::Disable, Tier::Basic) => DISABLE_BASIC,
        (ScriptCategory::Disable, Tier::Optimized) => DISABLE_OPTIMIZED,
        (ScriptCategory::Disable, Tier::Advanced) => DISABLE_ADVANCED,
        (ScriptCategory::Autofill, Tier::Basic) => AUTOFILL_BASIC,
        (ScriptCategory::Autofill, Tier::Optimized) => AUTOFILL_OPTIMIZED,
        (ScriptCategory::Autofill, Tier::Advanced) => AUTOFILL_ADVANCED,
        (ScriptCategory::Total, Tier::Basic) => TOTAL_BASIC,
        (ScriptCategory::Total, Tier::Optimized) => TOTAL_OPTIMIZED,
        (ScriptCategory::Total, Tier::Advanced) => TOTAL_ADVANCED,
    }
}

const CART_BASIC: &str = r#"function getItems() {
    let items = document.querySelector('__SELECTOR__');
    if (items) {
        return items.innerHTML;
    }
    return null;
}

getItems();"#;

const CART_OPTIMIZED: &str = r#"function getItems() {
    const container = document.querySelector('__SELECTOR__');
    if (!container) {
        console.warn('Cart container not found');
        return null;
    }
    return container.innerHTML;
}

// Execute and return
getItems();"#;

const CART_ADVANCED: &str = r#"function getItems() {
    const selectors = [
        '__SELECTOR__',
        '.cart-items',
        '.basket-items',
        '[data-cart]'
    ];
    
    for (const sel of selectors) {
        try {
            const element = document.querySelector(sel);
            if (element && element.innerHTML) {
                console.log('Cart items found:', sel);
                return element.innerHTML;
            }
        } catch (e) {
            console.warn('Selector failed:', sel, e);
        }
    }
    
    console.error('Cart items not found');
    return null;
}

getItems();"#;

const PAYMENT_BASIC: &str = r#"function hidePaymentMethods() {
    const container = document.querySelector('__SELECTOR__');
    if (!container) return;
    
    const methods = container.querySelectorAll('[class*="payment"], [id*="payment"]');
    methods.forEach(method => {
        const text = method.textContent.toLowerCase();
        if (!text.includes('карт') && !text.includes('card')) {
            method.style.display = 'none';
        }
    });
}

hidePaymentMethods();
document.addEventListener('DOMContentLoaded', hidePaymentMethods);"#;

const PAYMENT_OPTIMIZED: &str = r#"function hidePaymentMethods() {
    const container = document.querySelector('__SELECTOR__');
    if (!container) {
        console.warn('Payment container not found');
        return;
    }
    
    const methods = container.querySelectorAll('input[type="radio"]');
    methods.forEach(input => {
        const label = input.closest('label') || document.querySelector(`label[for="${input.id}"]`);
        const text = (label?.textContent || '').toLowerCase();
        
        if (!text.includes('карт') && !text.includes('card')) {
            input.disabled = true;
            const wrapper = input.closest('li, div, .payment-method');
            if (wrapper) wrapper.style.display = 'none';
        }
    });
}

hidePaymentMethods();
document.addEventListener('DOMContentLoaded', hidePaymentMethods);

const observer = new MutationObserver(hidePaymentMethods);
observer.observe(document.body, { childList: true, subtree: true });"#;

const PAYMENT_ADVANCED: &str = r#"function hidePaymentMethods() {
    const selectors = ['__SELECTOR__', '.payment-methods', '#payment'];
    
    let container = null;
    for (const sel of selectors) {
        try {
            container = document.querySelector(sel);
            if (container) break;
        } catch (e) {}
    }
    
    if (!container) {
        console.error('Payment container not found');
        return;
    }
    
    const cardKeywords = ['карт', 'card', 'credit', 'debit'];
    const methods = container.querySelectorAll('input[type="radio"], [class*="method"]');
    
    methods.forEach(el => {
        try {
            const text = (el.textContent || el.value || '').toLowerCase();
            const shouldKeep = cardKeywords.some(kw => text.includes(kw));
            
            if (!shouldKeep) {
                el.disabled = true;
                const wrapper = el.closest('li, div, .payment-option');
                if (wrapper) wrapper.style.display = 'none';
            }
        } catch (e) {
            console.warn('Error processing method:', e);
        }
    });
    
    console.log('Payment methods filtered');
}

hidePaymentMethods();
document.addEventListener('DOMContentLoaded', hidePaymentMethods);
document.addEventListener('click', hidePaymentMethods);

const observer = new MutationObserver(hidePaymentMethods);
observer.observe(document.body, { childList: true, subtree: true });"#;

const DISABLE_BASIC: &str = r#"function disableCardFilling() {
    const form = document.querySelector('__SELECTOR__');
    if (!form) return;
    
    const inputs = form.querySelectorAll('input:not([type="submit"]), select');
    inputs.forEach(input => {
        input.disabled = true;
    });
}

disableCardFilling();
document.addEventListener('DOMContentLoaded', disableCardFilling);"#;

const DISABLE_OPTIMIZED: &str = r#"function disableCardFilling() {
    const form = document.querySelector('__SELECTOR__');
    if (!form) {
        console.warn('Card form not found');
        return;
    }
    
    const cardFieldPatterns = [
        /card.*number|pan|номер/i,
        /cvv|cvc|security/i,
        /exp.*month|exp.*year/i
    ];
    
    form.querySelectorAll('input:not([type="submit"]), select').forEach(input => {
        const id = (input.name || input.id || input.placeholder || '').toLowerCase();
        const isCardField = cardFieldPatterns.some(pattern => pattern.test(id));
        
        if (isCardField) {
            input.readOnly = true;
            input.disabled = true;
        }
    });
    
    console.log('Card fields disabled');
}

disableCardFilling();
document.addEventListener('DOMContentLoaded', disableCardFilling);"#;

const DISABLE_ADVANCED: &str = r#"function disableCardFilling() {
    const selectors = ['__SELECTOR__', 'form[name*="payment"]', '.payment-form'];
    
    let form = null;
    for (const sel of selectors) {
        try {
            form = document.querySelector(sel);
            if (form) break;
        } catch (e) {}
    }
    
    if (!form) {
        console.error('Card form not found');
        return;
    }
    
    const cardFieldPatterns = [
        /card.*number|pan/i,
        /cvv|cvc|security/i,
        /exp.*month|exp.*year/i,
        /cardholder|name.*card/i
    ];
    
    let disabledCount = 0;
    
    form.querySelectorAll('input:not([type="submit"]), select').forEach(input => {
        try {
            const id = [input.name, input.id, input.placeholder].filter(Boolean).join(' ').toLowerCase();
            const isCardField = cardFieldPatterns.some(p => p.test(id));
            
            if (isCardField) {
                input.readOnly = true;
                input.disabled = true;
                disabledCount++;
            }
        } catch (e) {
            console.warn('Error disabling input:', e);
        }
    });
    
    console.log(`Disabled ${disabledCount} card fields`);
}

disableCardFilling();
document.addEventListener('DOMContentLoaded', disableCardFilling);"#;

const AUTOFILL_BASIC: &str = r#"function autofillCard(cardNumber, cardExpMonth, cardExpYear, cardCVV, cardholderName = '') {
    const form = document.querySelector('__SELECTOR__');
    if (!form) return;
    
    form.querySelectorAll('input').forEach(input => {
        const id = (input.name || input.id || '').toLowerCase();
        
        if (/number|pan/i.test(id)) input.value = cardNumber;
        else if (/month/i.test(id)) input.value = cardExpMonth;
        else if (/year/i.test(id)) input.value = cardExpYear;
        else if (/cvv|cvc/i.test(id)) input.value = cardCVV;
        else if (/cardholder|name/i.test(id)) input.value = cardholderName;
    });
}"#;

const AUTOFILL_OPTIMIZED: &str = r#"function autofillCard(cardNumber, cardExpMonth, cardExpYear, cardCVV, cardholderName = '') {
    const form = document.querySelector('__SELECTOR__');
    if (!form) {
        console.warn('Card form not found');
        return;
    }
    
    const fieldMap = {
        number: /card.*number|pan/i,
        month: /exp.*month/i,
        year: /exp.*year/i,
        cvv: /cvv|cvc|security/i,
        name: /cardholder|name.*card/i
    };
    
    const values = { number: cardNumber, month: cardExpMonth, year: cardExpYear, cvv: cardCVV, name: cardholderName };
    
    form.querySelectorAll('input, select').forEach(el => {
        const id = (el.name || el.id || el.placeholder || '').toLowerCase();
        
        for (const [field, pattern] of Object.entries(fieldMap)) {
            if (pattern.test(id) && values[field]) {
                el.value = values[field];
                el.dispatchEvent(new Event('input', { bubbles: true }));
                el.dispatchEvent(new Event('change', { bubbles: true }));
                break;
            }
        }
    });
    
    console.log('Card fields autofilled');
}"#;

const AUTOFILL_ADVANCED: &str = r#"function autofillCard(cardNumber, cardExpMonth, cardExpYear, cardCVV, cardholderName = '') {
    const selectors = ['__SELECTOR__', 'form[name*="payment"]', '.card-form'];
    
    let form = null;
    for (const sel of selectors) {
        try {
            form = document.querySelector(sel);
            if (form) break;
        } catch (e) {}
    }
    
    if (!form) {
        console.error('Card form not found');
        return;
    }
    
    const fieldMap = {
        number: { pattern: /card.*number|pan/i, value: cardNumber },
        month: { pattern: /exp.*month/i, value: cardExpMonth },
        year: { pattern: /exp.*year/i, value: cardExpYear },
        cvv: { pattern: /cvv|cvc|security/i, value: cardCVV },
        name: { pattern: /cardholder|name.*card/i, value: cardholderName }
    };
    
    let filledCount = 0;
    
    form.querySelectorAll('input, select').forEach(el => {
        try {
            if (el.readOnly || el.disabled) {
                el.readOnly = false;
                el.disabled = false;
            }
            
            const id = [el.name, el.id, el.placeholder].filter(Boolean).join(' ').toLowerCase();
            
            for (const [field, config] of Object.entries(fieldMap)) {
                if (config.pattern.test(id) && config.value) {
                    el.value = config.value;
                    ['input', 'change', 'blur'].forEach(eventType => {
                        el.dispatchEvent(new Event(eventType, { bubbles: true }));
                    });
                    filledCount++;
                    break;
                }
            }
        } catch (e) {
            console.warn('Error filling field:', e);
        }
    });
    
    console.log(`Autofilled ${filledCount} fields`);
}"#;

const TOTAL_BASIC: &str = r#"function getTotal() {
    const el = document.querySelector('__SELECTOR__');
    if (!el) return null;
    
    const text = el.textContent.replace(/\s+/g, ' ').trim();
    const match = text.match(/([\d.,]+)\s*([€$]|лв|BGN|EUR|USD)/i);
    
    if (!match) return null;
    
    let amount = match[1].replace(',', '.');
    let currency = match[2];
    
    if (currency === '€') currency = 'EUR';
    if (currency === '$') currency = 'USD';
    if (/лв/i.test(currency)) currency = 'BGN';
    
    return parseFloat(amount).toFixed(2) + ' ' + currency;
}

getTotal();"#;

const TOTAL_OPTIMIZED: &str = r#"function getTotal() {
    const el = document.querySelector('__SELECTOR__');
    if (!el) {
        console.warn('Total element not found');
        return null;
    }
    
    let text = el.textContent.replace(/\u00A0/g, ' ').replace(/\u202F/g, ' ').trim();
    
    const eurMatch = text.match(/\(([\d.,]+)\s*EUR\)/i);
    if (eurMatch) {
        return parseFloat(eurMatch[1].replace(',', '.')).toFixed(2) + ' EUR';
    }
    
    const match = text.match(/([\d.,]+)\s*([€$]|лв|BGN|EUR|USD)/i);
    if (!match) return null;
    
    let amount = match[1].replace(/\s/g, '');
    if (amount.includes(',') && amount.includes('.')) {
        amount = amount.replace(/\./g, '').replace(',', '.');
    } else if (amount.includes(',')) {
        amount = amount.replace(',', '.');
    }
    
    let currency = match[2];
    if (currency === '€') currency = 'EUR';
    if (currency === '$') currency = 'USD';
    if (/лв/i.test(currency)) currency = 'BGN';
    
    const value = parseFloat(amount);
    return isFinite(value) ? value.toFixed(2) + ' ' + currency : null;
}

getTotal();"#;

const TOTAL_ADVANCED: &str = r#"function getTotal() {
    const selectors = ['__SELECTOR__', '.order-total', '.grand-total', '#total-amount'];
    
    let element = null;
    for (const sel of selectors) {
        try {
            element = document.querySelector(sel);
            if (element) break;
        } catch (e) {}
    }
    
    if (!element) {
        console.error('Total element not found');
        return null;
    }
    
    let text = element.textContent
        .replace(/\u00A0/g, ' ')
        .replace(/\u202F/g, ' ')
        .replace(/\s+/g, ' ')
        .trim();
    
    const eurMatch = text.match(/\(([\d.,]+)\s*EUR\)/i);
    if (eurMatch) {
        const amount = parseFloat(eurMatch[1].replace(',', '.')).toFixed(2);
        console.log('Total extracted (EUR):', amount + ' EUR');
        return amount + ' EUR';
    }
    
    const match = text.match(/([\d.,\s]+)\s*([€$]|лв|BGN|EUR|USD)/i);
    if (!match) {
        console.warn('Could not extract total from:', text);
        return null;
    }
    
    let amount = match[1].replace(/\s/g, '');
    
    if (amount.includes(',') && amount.includes('.')) {
        const lastComma = amount.lastIndexOf(',');
        const lastDot = amount.lastIndexOf('.');
        amount = lastComma > lastDot ? 
            amount.replace(/\./g, '').replace(',', '.') :
            amount.replace(/,/g, '');
    } else if (amount.includes(',')) {
        amount = amount.replace(',', '.');
    }
    
    let currency = match[2];
    const currencyMap = { '€': 'EUR', '$': 'USD', 'лв': 'BGN', 'лв.': 'BGN' };
    currency = currencyMap[currency] || currency.toUpperCase();
    
    const value = parseFloat(amount);
    if (!isFinite(value)) {
        console.error('Invalid amount:', amount);
        return null;
    }
    
    const result = value.toFixed(2) + ' ' + currency;
    console.log('Total extracted:', result);
    return result;
}

getTotal();"#;
