//! Game window frames through the Windows Graphics Capture API.

use anyhow::{anyhow, Context, Result};
use image::{ImageBuffer, Rgba};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use windows::core::Interface;
use windows::Foundation::TypedEventHandler;
use windows::Graphics::Capture::{Direct3D11CaptureFramePool, GraphicsCaptureItem};
use windows::Graphics::DirectX::DirectXPixelFormat;
use windows::Win32::Foundation::{E_ACCESSDENIED, HWND};
use windows::Win32::Graphics::Direct3D::D3D_DRIVER_TYPE_HARDWARE;
use windows::Win32::Graphics::Direct3D11::{
    D3D11CreateDevice, ID3D11Device, ID3D11DeviceContext, ID3D11Resource, ID3D11Texture2D,
    D3D11_CPU_ACCESS_READ, D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_MAP_READ, D3D11_SDK_VERSION,
    D3D11_TEXTURE2D_DESC, D3D11_USAGE_STAGING,
};
use windows::Win32::System::WinRT::Direct3D11::{
    CreateDirect3D11DeviceFromDXGIDevice, IDirect3DDxgiInterfaceAccess,
};
use windows::Win32::System::WinRT::Graphics::Capture::IGraphicsCaptureItemInterop;
use windows::Win32::System::WinRT::{RoInitialize, RO_INIT_MULTITHREADED};

use super::source::FrameSource;
use super::window::{find_window_by_process, get_client_area_info};
use crate::error::CaptureError;

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Grabs one frame of a window, cropped to its client area and converted to RGBA.
pub fn capture_client_area(hwnd: HWND) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    // Already-initialized threads report S_FALSE or a mode change; both are fine
    let _ = unsafe { RoInitialize(RO_INIT_MULTITHREADED) };

    let (client_rect, client_offset) = get_client_area_info(hwnd)?;
    let client_width = (client_rect.right - client_rect.left).max(0) as u32;
    let client_height = (client_rect.bottom - client_rect.top).max(0) as u32;

    let (device, context) = create_d3d11_device()?;
    let item = create_capture_item(hwnd).context("Failed to create capture item for window")?;
    let size = item.Size()?;

    let d3d_device = create_direct3d_device(&device)?;
    let frame_pool = Direct3D11CaptureFramePool::CreateFreeThreaded(
        &d3d_device,
        DirectXPixelFormat::B8G8R8A8UIntNormalized,
        1,
        size,
    )?;
    let session = frame_pool.CreateCaptureSession(&item)?;

    let frame_arrived = Arc::new(AtomicBool::new(false));
    let frame_arrived_clone = frame_arrived.clone();
    frame_pool.FrameArrived(&TypedEventHandler::new(
        move |_pool: &Option<Direct3D11CaptureFramePool>, _| {
            frame_arrived_clone.store(true, Ordering::SeqCst);
            Ok(())
        },
    ))?;

    session.StartCapture()?;

    let start = Instant::now();
    while !frame_arrived.load(Ordering::SeqCst) {
        if start.elapsed() > FRAME_TIMEOUT {
            let _ = session.Close();
            let _ = frame_pool.Close();
            return Err(anyhow!("Timeout waiting for frame"));
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    let frame = frame_pool.TryGetNextFrame()?;
    let surface = frame.Surface()?;
    let access: IDirect3DDxgiInterfaceAccess = surface.cast()?;
    let texture: ID3D11Texture2D = unsafe { access.GetInterface()? };

    let mut desc = D3D11_TEXTURE2D_DESC::default();
    unsafe { texture.GetDesc(&mut desc) };

    // Staging copy the CPU can map
    let staging_desc = D3D11_TEXTURE2D_DESC {
        Width: desc.Width,
        Height: desc.Height,
        MipLevels: 1,
        ArraySize: 1,
        Format: desc.Format,
        SampleDesc: desc.SampleDesc,
        Usage: D3D11_USAGE_STAGING,
        BindFlags: Default::default(),
        CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
        MiscFlags: Default::default(),
    };

    let staging_texture = unsafe {
        let mut staging: Option<ID3D11Texture2D> = None;
        device.CreateTexture2D(&staging_desc, None, Some(&mut staging))?;
        staging.ok_or_else(|| anyhow!("Failed to create staging texture"))?
    };
    let staging_resource = staging_texture.cast::<ID3D11Resource>()?;

    unsafe {
        context.CopyResource(&staging_resource, &texture.cast::<ID3D11Resource>()?);
    }

    let mapped = unsafe {
        let mut mapped = Default::default();
        context.Map(&staging_resource, 0, D3D11_MAP_READ, 0, Some(&mut mapped))?;
        mapped
    };

    let src_data = unsafe {
        std::slice::from_raw_parts(
            mapped.pData as *const u8,
            (mapped.RowPitch * desc.Height) as usize,
        )
    };
    let row_pitch = mapped.RowPitch as usize;
    let crop_x = client_offset.x.max(0) as u32;
    let crop_y = client_offset.y.max(0) as u32;

    let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(client_width, client_height);
    for y in 0..client_height {
        let src_y = (crop_y + y) as usize;
        if src_y >= desc.Height as usize {
            break;
        }
        for x in 0..client_width {
            let src_x = (crop_x + x) as usize;
            if src_x >= desc.Width as usize {
                break;
            }
            let offset = src_y * row_pitch + src_x * 4;
            // BGRA -> RGBA
            img.put_pixel(
                x,
                y,
                Rgba([
                    src_data[offset + 2],
                    src_data[offset + 1],
                    src_data[offset],
                    src_data[offset + 3],
                ]),
            );
        }
    }

    unsafe { context.Unmap(&staging_resource, 0) };
    session.Close()?;
    frame_pool.Close()?;

    Ok(img)
}

fn create_d3d11_device() -> Result<(ID3D11Device, ID3D11DeviceContext)> {
    let mut device: Option<ID3D11Device> = None;
    let mut context: Option<ID3D11DeviceContext> = None;

    unsafe {
        D3D11CreateDevice(
            None,
            D3D_DRIVER_TYPE_HARDWARE,
            None,
            D3D11_CREATE_DEVICE_BGRA_SUPPORT,
            None,
            D3D11_SDK_VERSION,
            Some(&mut device),
            None,
            Some(&mut context),
        )?;
    }

    Ok((
        device.ok_or_else(|| anyhow!("Failed to create D3D11 device"))?,
        context.ok_or_else(|| anyhow!("Failed to create D3D11 context"))?,
    ))
}

/// WinRT device wrapper required by the capture frame pool.
fn create_direct3d_device(
    device: &ID3D11Device,
) -> Result<windows::Graphics::DirectX::Direct3D11::IDirect3DDevice> {
    let dxgi_device: windows::Win32::Graphics::Dxgi::IDXGIDevice = device.cast()?;
    let inspectable = unsafe { CreateDirect3D11DeviceFromDXGIDevice(&dxgi_device)? };
    inspectable
        .cast()
        .context("Failed to cast to IDirect3DDevice")
}

fn create_capture_item(hwnd: HWND) -> windows::core::Result<GraphicsCaptureItem> {
    let class_name = windows::core::h!("Windows.Graphics.Capture.GraphicsCaptureItem");
    let interop: IGraphicsCaptureItemInterop =
        unsafe { windows::Win32::System::WinRT::RoGetActivationFactory(class_name)? };
    unsafe { interop.CreateForWindow(hwnd) }
}

/// Frames of the game window, one capture per call.
///
/// The window handle is kept as an integer so the source can move to the
/// session's worker thread.
pub struct WindowFrameSource {
    process_name: String,
    hwnd: Option<isize>,
}

impl WindowFrameSource {
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
            hwnd: None,
        }
    }
}

impl FrameSource for WindowFrameSource {
    fn open(&mut self) -> Result<(), CaptureError> {
        let _ = unsafe { RoInitialize(RO_INIT_MULTITHREADED) };

        let hwnd = find_window_by_process(&self.process_name)
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        // Probe once so a refused capture surfaces here rather than every tick
        create_capture_item(hwnd).map_err(|e| {
            if e.code() == E_ACCESSDENIED {
                CaptureError::PermissionDenied(e.message().to_string())
            } else {
                CaptureError::DeviceUnavailable(e.message().to_string())
            }
        })?;

        crate::log(&format!("Capturing window of {}", self.process_name));
        self.hwnd = Some(hwnd.0 as isize);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
        let raw = self
            .hwnd
            .ok_or_else(|| anyhow!("Window source is not open"))?;
        capture_client_area(HWND(raw as *mut _))
    }

    fn close(&mut self) {
        self.hwnd = None;
    }
}
