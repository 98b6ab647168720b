//! Win32 print spooler backend
//!
//! Enumeration via `EnumPrintersW` / `GetDefaultPrinterW` / `GetPrinterW`,
//! raw jobs via `OpenPrinterW` -> `StartDocPrinterW` (RAW) -> `StartPagePrinter`
//! -> `WritePrinter` -> `EndPagePrinter` -> `EndDocPrinter` -> `ClosePrinter`.

use core::ffi::c_void;

use tracing::{debug, instrument};
use windows::Win32::Graphics::Printing::{
    ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, EnumPrintersW, GetDefaultPrinterW,
    GetPrinterW, OpenPrinterW, PRINTER_ATTRIBUTE_WORK_OFFLINE, PRINTER_ENUM_CONNECTIONS,
    PRINTER_ENUM_LOCAL, PRINTER_HANDLE, PRINTER_INFO_2W, PRINTER_INFO_4W, PRINTER_STATUS_OFFLINE,
    StartDocPrinterW, StartPagePrinter, WritePrinter,
};
use windows::core::{PCWSTR, PWSTR};

use crate::error::{PrintError, PrintResult};
use crate::spooler::{PrinterDetails, SpoolSession, Spooler, SpoolerEntry};

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Read a spooler-owned wide string, empty when null
unsafe fn read_pwstr(p: PWSTR) -> String {
    if p.is_null() {
        String::new()
    } else {
        unsafe { p.to_string().unwrap_or_default() }
    }
}

/// Open spooler handle
///
/// Spooler handles are not tied to the opening thread.
pub struct SpoolHandle(PRINTER_HANDLE);

unsafe impl Send for SpoolHandle {}

/// Windows spooler (local and connected printers)
#[derive(Debug, Default, Clone)]
pub struct WindowsSpooler;

impl WindowsSpooler {
    pub fn new() -> Self {
        Self
    }

    fn open_handle(name: &str) -> PrintResult<PRINTER_HANDLE> {
        let name_w = to_wide(name);
        let mut handle = PRINTER_HANDLE::default();
        unsafe {
            OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None)
                .map_err(|e| PrintError::NotFound(format!("{}: OpenPrinterW failed: {}", name, e)))?;
        }
        Ok(handle)
    }
}

impl Spooler for WindowsSpooler {
    #[instrument(skip(self))]
    fn enumerate(&self) -> PrintResult<Vec<SpoolerEntry>> {
        let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
        let mut needed: u32 = 0;
        let mut returned: u32 = 0;

        unsafe {
            let _ = EnumPrintersW(flags, None, 4, None, &mut needed, &mut returned);

            if needed == 0 {
                return Ok(Vec::new());
            }

            let mut buf: Vec<u8> = vec![0; needed as usize];
            EnumPrintersW(
                flags,
                None,
                4,
                Some(buf.as_mut_slice()),
                &mut needed,
                &mut returned,
            )
            .map_err(|e| PrintError::Enumeration(format!("EnumPrintersW failed: {}", e)))?;

            let ptr = buf.as_ptr() as *const PRINTER_INFO_4W;
            let slice = std::slice::from_raw_parts(ptr, returned as usize);

            let entries: Vec<SpoolerEntry> = slice
                .iter()
                .filter(|info| !info.pPrinterName.is_null())
                .map(|info| {
                    let name = read_pwstr(info.pPrinterName);
                    let offline = info.Attributes & PRINTER_ATTRIBUTE_WORK_OFFLINE != 0;
                    SpoolerEntry::new(name).offline(offline)
                })
                .collect();

            debug!(count = entries.len(), "EnumPrintersW returned printers");
            Ok(entries)
        }
    }

    fn default_printer(&self) -> PrintResult<Option<String>> {
        unsafe {
            let mut needed: u32 = 0;
            let _ = GetDefaultPrinterW(None, &mut needed);

            if needed == 0 {
                return Ok(None);
            }

            let mut buf: Vec<u16> = vec![0; needed as usize];
            let ok = GetDefaultPrinterW(Some(PWSTR(buf.as_mut_ptr())), &mut needed);

            if !ok.as_bool() {
                return Ok(None);
            }

            let name = PWSTR(buf.as_mut_ptr())
                .to_string()
                .map_err(|e| PrintError::WindowsPrinter(format!("UTF-16 decode failed: {}", e)))?;

            Ok(Some(name))
        }
    }

    #[instrument(skip(self))]
    fn printer_details(&self, name: &str) -> PrintResult<PrinterDetails> {
        let handle = Self::open_handle(name)?;

        let result = unsafe {
            let mut needed: u32 = 0;
            let _ = GetPrinterW(handle, 2, None, &mut needed);

            if needed == 0 {
                Err(PrintError::spooler(name, "GetPrinterW returned no data"))
            } else {
                let mut buf: Vec<u8> = vec![0; needed as usize];
                match GetPrinterW(handle, 2, Some(buf.as_mut_slice()), &mut needed) {
                    Ok(()) => {
                        let info = &*(buf.as_ptr() as *const PRINTER_INFO_2W);
                        let offline = (info.Status & PRINTER_STATUS_OFFLINE) != 0
                            || (info.Attributes & PRINTER_ATTRIBUTE_WORK_OFFLINE) != 0;
                        Ok(PrinterDetails {
                            driver_name: read_pwstr(info.pDriverName),
                            port_name: read_pwstr(info.pPortName),
                            offline: Some(offline),
                        })
                    }
                    Err(e) => Err(PrintError::spooler(name, format!("GetPrinterW failed: {}", e))),
                }
            }
        };

        unsafe {
            let _ = ClosePrinter(handle);
        }
        result
    }
}

impl SpoolSession for WindowsSpooler {
    type Handle = SpoolHandle;

    fn open(&self, printer_name: &str) -> PrintResult<SpoolHandle> {
        Self::open_handle(printer_name).map(SpoolHandle)
    }

    fn start_doc(&self, handle: &mut SpoolHandle, doc_name: &str) -> PrintResult<()> {
        let doc_name_w = to_wide(doc_name);
        let datatype_w = to_wide("RAW");
        let doc_info = DOC_INFO_1W {
            pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
            pOutputFile: PWSTR::null(),
            pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
        };

        let job_id = unsafe { StartDocPrinterW(handle.0, 1, &doc_info as *const DOC_INFO_1W) };
        if job_id == 0 {
            return Err(PrintError::WindowsPrinter(
                "StartDocPrinter failed".to_string(),
            ));
        }
        debug!(job_id, "Raw job started");
        Ok(())
    }

    fn start_page(&self, handle: &mut SpoolHandle) -> PrintResult<()> {
        if !unsafe { StartPagePrinter(handle.0) }.as_bool() {
            return Err(PrintError::WindowsPrinter(
                "StartPagePrinter failed".to_string(),
            ));
        }
        Ok(())
    }

    fn write(&self, handle: &mut SpoolHandle, data: &[u8]) -> PrintResult<usize> {
        let len = u32::try_from(data.len())
            .map_err(|_| PrintError::WindowsPrinter(format!("Job too large: {} bytes", data.len())))?;

        let mut written: u32 = 0;
        let ok = unsafe {
            WritePrinter(
                handle.0,
                data.as_ptr() as *const c_void,
                len,
                &mut written,
            )
        };

        if !ok.as_bool() {
            return Err(PrintError::WindowsPrinter(
                "WritePrinter failed".to_string(),
            ));
        }
        Ok(written as usize)
    }

    fn end_page(&self, handle: &mut SpoolHandle) -> PrintResult<()> {
        if !unsafe { EndPagePrinter(handle.0) }.as_bool() {
            return Err(PrintError::WindowsPrinter("EndPagePrinter failed".to_string()));
        }
        Ok(())
    }

    fn end_doc(&self, handle: &mut SpoolHandle) -> PrintResult<()> {
        if !unsafe { EndDocPrinter(handle.0) }.as_bool() {
            return Err(PrintError::WindowsPrinter("EndDocPrinter failed".to_string()));
        }
        Ok(())
    }

    fn close(&self, handle: &mut SpoolHandle) -> PrintResult<()> {
        unsafe { ClosePrinter(handle.0) }
            .map_err(|e| PrintError::WindowsPrinter(format!("ClosePrinter failed: {}", e)))
    }
}
